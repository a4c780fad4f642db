use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::ServerConfig;
use crate::core::{ExternalInvocation, InvocationOutput, Result, ScriptRunner};
use crate::utils::error::ConfluenceError;

const UNKNOWN_STDERR: &str = "unknown error";
const UNKNOWN_IN_BAND: &str = "Unknown error";

/// Runs a transform script and turns its stdout into a JSON document.
///
/// One call is one process: no retries, no caching. Failures are classified in a fixed
/// order: missing script, missing interpreter, timeout, non-zero exit, unparseable
/// output, and finally an `{"error": ...}` object written by the script itself.
pub struct TransformGateway {
    runner: Arc<dyn ScriptRunner>,
    interpreter: String,
    timeout: Duration,
    preview_chars: usize,
}

impl TransformGateway {
    pub fn new(runner: Arc<dyn ScriptRunner>, config: &ServerConfig) -> Self {
        Self {
            runner,
            interpreter: config.interpreter.command.clone(),
            timeout: config.execution_timeout(),
            preview_chars: config.execution.preview_chars,
        }
    }

    /// Invoke `script`, passing `payload` on stdin. `None` runs the script in demo mode.
    pub async fn invoke(&self, script: &Path, payload: Option<&Value>) -> Result<Value> {
        if !script.is_file() {
            tracing::error!("❌ Script not found at {}", script.display());
            return Err(ConfluenceError::ScriptNotFound {
                path: script.display().to_string(),
            });
        }

        let mut invocation = ExternalInvocation::new(&self.interpreter, self.timeout)
            .arg(script.display().to_string());
        if let Some(payload) = payload {
            invocation = invocation.stdin(serde_json::to_string(payload)?);
        }

        tracing::info!(
            script = %script.display(),
            demo_mode = payload.is_none(),
            "Executing script..."
        );

        let output = self.runner.run(&invocation).await?;

        tracing::info!(
            "Script completed - exit code: {:?}, stdout length: {} chars",
            output.exit_code,
            output.stdout.len()
        );
        if !output.stderr.is_empty() {
            tracing::warn!("Script stderr: {}", output.stderr.trim_end());
        }

        interpret_output(output, self.preview_chars)
    }
}

/// Classify a finished process: non-zero exit, then JSON parsing, then in-band errors.
pub fn interpret_output(output: InvocationOutput, preview_chars: usize) -> Result<Value> {
    if !output.success() {
        let stderr = if output.stderr.trim().is_empty() {
            UNKNOWN_STDERR.to_string()
        } else {
            output.stderr
        };
        return Err(ConfluenceError::ExecutionFailed { stderr });
    }

    let data: Value = serde_json::from_str(&output.stdout).map_err(|e| {
        ConfluenceError::InvalidOutput {
            reason: e.to_string(),
            preview: preview(&output.stdout, preview_chars),
        }
    })?;

    if let Some(message) = in_band_error(&data) {
        return Err(ConfluenceError::ScriptReported { message });
    }

    Ok(data)
}

/// `Some(message)` when `data` is an object whose `"error"` field is truthy.
pub fn in_band_error(data: &Value) -> Option<String> {
    let object = data.as_object()?;
    if !object.get("error").is_some_and(is_truthy) {
        return None;
    }

    let message = match object.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Null) | None => UNKNOWN_IN_BAND.to_string(),
        Some(other) => other.to_string(),
    };
    Some(message)
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// First `max_chars` characters of `text`, never splitting a UTF-8 sequence.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
