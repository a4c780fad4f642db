use std::sync::Arc;

use crate::config::{ScriptPaths, ServerConfig};
use crate::core::{Diagnostics, ScriptRunner, TransformGateway};

/// Shared, immutable state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<TransformGateway>,
    pub diagnostics: Arc<Diagnostics>,
    pub scripts: Arc<ScriptPaths>,
}

impl AppState {
    pub fn new(runner: Arc<dyn ScriptRunner>, config: &ServerConfig) -> Self {
        Self {
            gateway: Arc::new(TransformGateway::new(runner.clone(), config)),
            diagnostics: Arc::new(Diagnostics::new(runner, config)),
            scripts: Arc::new(config.script_paths()),
        }
    }
}
