use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::utils::error::{ConfluenceError, Result};
use crate::utils::validation::{validate_min_len, validate_one_of};

/// FFT 所需的最少資料點
pub const MIN_SERIES_LEN: usize = 4;

fn default_sample_rate() -> Option<f64> {
    Some(1.0)
}

fn default_n_peaks() -> Option<i64> {
    Some(8)
}

/// Body of `POST /api/spectrum/analyze`.
///
/// Either `series` alone, or the pair `series1`/`series2` for cross-spectral analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrumRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series1: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series2: Option<Vec<f64>>,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: Option<f64>,
    #[serde(default = "default_n_peaks")]
    pub n_peaks: Option<i64>,
}

impl SpectrumRequest {
    pub fn single(series: Vec<f64>) -> Self {
        Self {
            series: Some(series),
            series1: None,
            series2: None,
            sample_rate: default_sample_rate(),
            n_peaks: default_n_peaks(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.series.is_none() && (self.series1.is_none() || self.series2.is_none()) {
            return Err(ConfluenceError::validation(
                "Must provide either 'series' or both 'series1' and 'series2'",
            ));
        }

        for (label, values) in [
            ("Series", &self.series),
            ("Series1", &self.series1),
            ("Series2", &self.series2),
        ] {
            if let Some(values) = values {
                validate_min_len(label, values, MIN_SERIES_LEN)?;
            }
        }

        Ok(())
    }

    pub fn to_payload(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoomSystem {
    Lorenz,
    Automaton,
    Fibonacci,
    Clifford,
}

impl LoomSystem {
    pub const ALL: [LoomSystem; 4] = [
        LoomSystem::Lorenz,
        LoomSystem::Automaton,
        LoomSystem::Fibonacci,
        LoomSystem::Clifford,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoomSystem::Lorenz => "lorenz",
            LoomSystem::Automaton => "automaton",
            LoomSystem::Fibonacci => "fibonacci",
            LoomSystem::Clifford => "clifford",
        }
    }

    pub fn names() -> [&'static str; 4] {
        Self::ALL.map(|system| system.as_str())
    }
}

impl FromStr for LoomSystem {
    type Err = ConfluenceError;

    fn from_str(s: &str) -> Result<Self> {
        validate_one_of("system", s, &Self::names())?;
        Self::ALL
            .into_iter()
            .find(|system| system.as_str() == s)
            .ok_or_else(|| ConfluenceError::validation(format!("Unknown system: {}", s)))
    }
}

/// Body of `POST /api/loom/generate`. `params` is forwarded untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct LoomRequest {
    pub system: String,
    #[serde(default)]
    pub params: Option<Map<String, Value>>,
}

impl LoomRequest {
    pub fn system(&self) -> Result<LoomSystem> {
        self.system.parse()
    }

    /// 驗證後產生送往腳本的 stdin 內容
    pub fn to_payload(&self) -> Result<Value> {
        let system = self.system()?;
        Ok(serde_json::json!({
            "system": system.as_str(),
            "params": self.params.clone().unwrap_or_default(),
        }))
    }
}

/// One subprocess execution. Never reused across requests.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub timeout: Duration,
}

impl ExternalInvocation {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn stdin(mut self, payload: impl Into<String>) -> Self {
        self.stdin = Some(payload.into());
        self
    }
}

/// Captured result of a process that ran to completion (it may still have failed).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl InvocationOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Result of asking the interpreter for its version.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InterpreterProbe {
    #[serde(rename = "r_available")]
    pub available: bool,
    pub version: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TrialRun {
    #[serde(rename = "test_execution_returncode", skip_serializing_if = "Option::is_none")]
    pub returncode: Option<i32>,
    #[serde(rename = "test_execution_success")]
    pub success: bool,
    #[serde(rename = "test_output_valid_json", skip_serializing_if = "Option::is_none")]
    pub valid_json: Option<bool>,
    #[serde(rename = "test_output_preview", skip_serializing_if = "Option::is_none")]
    pub output_preview: Option<String>,
    #[serde(rename = "test_error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Environment readiness for one script. Built only through [`DiagnosticReport::new`],
/// which derives `pipeline_ready` from the four checks.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiagnosticReport {
    #[serde(rename = "r_script_path")]
    pub script_path: String,
    #[serde(rename = "r_script_exists")]
    pub script_exists: bool,
    #[serde(rename = "r_script_absolute_path")]
    pub script_absolute_path: String,
    #[serde(rename = "r_installed")]
    pub interpreter_installed: bool,
    #[serde(rename = "r_version")]
    pub interpreter_version: Option<String>,
    #[serde(rename = "r_check_error", skip_serializing_if = "Option::is_none")]
    pub interpreter_error: Option<String>,
    #[serde(rename = "jsonlite_installed")]
    pub helper_library_installed: bool,
    #[serde(rename = "jsonlite_check_error", skip_serializing_if = "Option::is_none")]
    pub helper_library_error: Option<String>,
    #[serde(flatten)]
    pub trial: TrialRun,
    pipeline_ready: bool,
}

#[derive(Debug, Clone)]
pub struct ScriptCheck {
    pub path: PathBuf,
    pub absolute_path: PathBuf,
    pub exists: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LibraryCheck {
    pub installed: bool,
    pub error: Option<String>,
}

impl DiagnosticReport {
    pub fn new(
        script: ScriptCheck,
        interpreter: &InterpreterProbe,
        library: LibraryCheck,
        trial: TrialRun,
    ) -> Self {
        let pipeline_ready =
            script.exists && interpreter.available && library.installed && trial.success;

        Self {
            script_path: script.path.display().to_string(),
            script_exists: script.exists,
            script_absolute_path: script.absolute_path.display().to_string(),
            interpreter_installed: interpreter.available,
            interpreter_version: interpreter.version.clone(),
            interpreter_error: interpreter.error.clone(),
            helper_library_installed: library.installed,
            helper_library_error: library.error,
            trial,
            pipeline_ready,
        }
    }

    pub fn pipeline_ready(&self) -> bool {
        self.pipeline_ready
    }
}
