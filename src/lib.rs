pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::TokioScriptRunner;
pub use crate::app::{build_router, serve, AppState};
pub use crate::config::{CliArgs, ServerConfig};
pub use crate::core::{Diagnostics, ScriptRunner, TransformGateway};
pub use crate::utils::error::{ConfluenceError, Result};
