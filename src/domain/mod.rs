// Domain layer: request/response models, the loom catalog and the ports the gateway depends on.

pub mod catalog;
pub mod model;
pub mod ports;
