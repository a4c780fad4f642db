use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::ServerConfig;
use crate::core::gateway::preview;
use crate::core::{ExternalInvocation, ScriptRunner};
use crate::domain::model::{
    DiagnosticReport, InterpreterProbe, LibraryCheck, ScriptCheck, TrialRun,
};
use crate::utils::error::ConfluenceError;

const TRIAL_PREVIEW_CHARS: usize = 200;

/// Read-only environment checks. Nothing here returns an error: every failure
/// becomes a field of the report.
pub struct Diagnostics {
    runner: Arc<dyn ScriptRunner>,
    interpreter: String,
    version_flag: String,
    helper_library: String,
    probe_timeout: Duration,
    trial_timeout: Duration,
}

impl Diagnostics {
    pub fn new(runner: Arc<dyn ScriptRunner>, config: &ServerConfig) -> Self {
        Self {
            runner,
            interpreter: config.interpreter.command.clone(),
            version_flag: config.interpreter.version_flag.clone(),
            helper_library: config.interpreter.helper_library.clone(),
            probe_timeout: config.probe_timeout(),
            trial_timeout: config.trial_timeout(),
        }
    }

    /// Ask the interpreter for its version.
    pub async fn probe_interpreter(&self) -> InterpreterProbe {
        let invocation =
            ExternalInvocation::new(&self.interpreter, self.probe_timeout).arg(&self.version_flag);

        match self.runner.run(&invocation).await {
            Ok(output) if output.success() => {
                // R 把版本資訊寫到 stderr
                let version = first_line(&output.stderr)
                    .or_else(|| first_line(&output.stdout))
                    .unwrap_or_else(|| "unknown".to_string());
                InterpreterProbe {
                    available: true,
                    version: Some(version),
                    status: "R engine operational".to_string(),
                    error: None,
                }
            }
            Ok(output) => InterpreterProbe {
                available: false,
                version: None,
                status: "R command failed".to_string(),
                error: Some(output.stderr),
            },
            Err(ConfluenceError::InterpreterNotFound { command }) => InterpreterProbe {
                available: false,
                version: None,
                status: format!("{} command not found - R may not be installed", command),
                error: None,
            },
            Err(e) => InterpreterProbe {
                available: false,
                version: None,
                status: format!("Error testing R: {}", e),
                error: Some(e.to_string()),
            },
        }
    }

    pub async fn check_helper_library(&self) -> LibraryCheck {
        let expression = format!("library({}); cat('OK')", self.helper_library);
        let invocation = ExternalInvocation::new(&self.interpreter, self.probe_timeout)
            .arg("-e")
            .arg(expression);

        match self.runner.run(&invocation).await {
            Ok(output) => LibraryCheck {
                installed: output.success() && output.stdout.contains("OK"),
                error: None,
            },
            Err(e) => LibraryCheck {
                installed: false,
                error: Some(e.to_string()),
            },
        }
    }

    /// Run the script in demo mode and inspect what it prints.
    pub async fn trial_run(&self, script: &Path) -> TrialRun {
        let invocation = ExternalInvocation::new(&self.interpreter, self.trial_timeout)
            .arg(script.display().to_string());

        let output = match self.runner.run(&invocation).await {
            Ok(output) => output,
            Err(ConfluenceError::Timeout { seconds }) => {
                return TrialRun {
                    success: false,
                    error: Some(format!("Execution timed out after {} seconds", seconds)),
                    ..TrialRun::default()
                };
            }
            Err(e) => {
                return TrialRun {
                    success: false,
                    error: Some(e.to_string()),
                    ..TrialRun::default()
                };
            }
        };

        if !output.success() {
            return TrialRun {
                returncode: output.exit_code,
                success: false,
                valid_json: Some(false),
                output_preview: (!output.stdout.is_empty())
                    .then(|| preview(&output.stdout, TRIAL_PREVIEW_CHARS)),
                error: Some(output.stderr),
            };
        }

        let valid_json = serde_json::from_str::<Value>(&output.stdout).is_ok();
        let mut output_preview = preview(&output.stdout, TRIAL_PREVIEW_CHARS);
        if valid_json && output_preview.len() < output.stdout.len() {
            output_preview.push_str("...");
        }

        TrialRun {
            returncode: output.exit_code,
            success: true,
            valid_json: Some(valid_json),
            output_preview: Some(output_preview),
            error: None,
        }
    }

    /// Full pipeline diagnostic for one script; recomputed on every call.
    pub async fn diagnose(&self, script: &Path) -> DiagnosticReport {
        let script_check = ScriptCheck {
            path: script.to_path_buf(),
            absolute_path: std::path::absolute(script).unwrap_or_else(|_| script.to_path_buf()),
            exists: script.is_file(),
        };

        let interpreter = self.probe_interpreter().await;
        let library = self.check_helper_library().await;

        let trial = if script_check.exists && interpreter.available {
            self.trial_run(script).await
        } else {
            TrialRun {
                success: false,
                error: Some(
                    "Cannot test - script doesn't exist or R not installed".to_string(),
                ),
                ..TrialRun::default()
            }
        };

        let report = DiagnosticReport::new(script_check, &interpreter, library, trial);
        tracing::info!(
            script = %script.display(),
            pipeline_ready = report.pipeline_ready(),
            "Diagnostics computed"
        );
        report
    }
}

fn first_line(text: &str) -> Option<String> {
    text.trim()
        .lines()
        .next()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}
