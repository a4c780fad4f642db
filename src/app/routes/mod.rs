pub mod iris;
pub mod loom;
pub mod root;
pub mod spectrum;
