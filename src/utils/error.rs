use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfluenceError {
    #[error("{message}")]
    ValidationError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigError { field: String, message: String },

    #[error("Script not found at {path}")]
    ScriptNotFound { path: String },

    #[error("Interpreter '{command}' not found. Is it installed?")]
    InterpreterNotFound { command: String },

    #[error("Script execution timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Script execution failed: {stderr}")]
    ExecutionFailed { stderr: String },

    #[error("Failed to parse script output as JSON: {reason} (output preview: {preview})")]
    InvalidOutput { reason: String, preview: String },

    #[error("Script error: {message}")]
    ScriptReported { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Server error: {message}")]
    ServerError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 呼叫端輸入錯誤
    Client,
    /// 缺少腳本或設定錯誤
    Configuration,
    /// 直譯器未安裝
    Dependency,
    /// 腳本執行失敗、輸出無效或回報錯誤
    Execution,
    Timeout,
    Internal,
}

impl ConfluenceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationError { .. } => ErrorCategory::Client,
            Self::ConfigError { .. } | Self::ScriptNotFound { .. } => ErrorCategory::Configuration,
            Self::InterpreterNotFound { .. } => ErrorCategory::Dependency,
            Self::ExecutionFailed { .. }
            | Self::InvalidOutput { .. }
            | Self::ScriptReported { .. } => ErrorCategory::Execution,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::IoError(_) | Self::SerializationError(_) | Self::ServerError { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    /// 錯誤類型的簡短識別字，回應給 HTTP 呼叫端
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationError { .. } => "validation",
            Self::ConfigError { .. } => "configuration",
            Self::ScriptNotFound { .. } => "script_not_found",
            Self::InterpreterNotFound { .. } => "interpreter_not_found",
            Self::Timeout { .. } => "timeout",
            Self::ExecutionFailed { .. } => "execution",
            Self::InvalidOutput { .. } => "invalid_output",
            Self::ScriptReported { .. } => "script_error",
            Self::IoError(_) | Self::SerializationError(_) | Self::ServerError { .. } => {
                "internal"
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ValidationError { .. } => "Check the request body against the endpoint's expected shape",
            Self::ConfigError { .. } => "Fix the configuration file or the overriding CLI flag",
            Self::ScriptNotFound { .. } => "Verify [scripts].root and the script file names in the configuration",
            Self::InterpreterNotFound { .. } => "Install the interpreter or set [interpreter].command to its full path",
            Self::Timeout { .. } => "Reduce the input size or raise [execution].timeout_seconds",
            Self::ExecutionFailed { .. } => "Run the script by hand with the same input and inspect its stderr",
            Self::InvalidOutput { .. } => "Make sure the script writes exactly one JSON document to stdout",
            Self::ScriptReported { .. } => "Inspect the parameters sent to the script",
            Self::IoError(_) | Self::SerializationError(_) | Self::ServerError { .. } => {
                "Check the server logs for details"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfluenceError>;
