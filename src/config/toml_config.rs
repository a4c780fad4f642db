use crate::utils::error::{ConfluenceError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 啟動時建立一次，之後唯讀共用
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: HttpConfig,
    pub interpreter: InterpreterConfig,
    pub scripts: ScriptsConfig,
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    pub command: String,
    pub version_flag: String,
    pub helper_library: String,
    pub probe_timeout_seconds: u64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            command: "Rscript".to_string(),
            version_flag: "--version".to_string(),
            helper_library: "jsonlite".to_string(),
            probe_timeout_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// 相對路徑以服務的工作目錄為基準
    pub root: String,
    pub iris: String,
    pub spectrum: String,
    pub loom: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            root: "r_scripts".to_string(),
            iris: "iris_transform.R".to_string(),
            spectrum: "spectral_analysis.R".to_string(),
            loom: "loom_generators.R".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub timeout_seconds: u64,
    pub trial_timeout_seconds: u64,
    pub preview_chars: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            trial_timeout_seconds: 10,
            preview_chars: 500,
        }
    }
}

/// Resolved locations of the three transform scripts.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptPaths {
    pub iris: PathBuf,
    pub spectrum: PathBuf,
    pub loom: PathBuf,
}

impl ScriptsConfig {
    pub fn resolve(&self) -> ScriptPaths {
        let root = Path::new(&self.root);
        ScriptPaths {
            iris: root.join(&self.iris),
            spectrum: root.join(&self.spectrum),
            loom: root.join(&self.loom),
        }
    }
}

impl ServerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ConfluenceError::ConfigError {
            field: path.as_ref().display().to_string(),
            message: format!("Cannot read config file: {}", e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ConfluenceError::ConfigError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CONFLUENCE_BIND})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfluenceError::ConfigError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        validation::validate_socket_addr("server.bind", &self.server.bind)
    }

    pub fn script_paths(&self) -> ScriptPaths {
        self.scripts.resolve()
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution.timeout_seconds)
    }

    pub fn trial_timeout(&self) -> Duration {
        Duration::from_secs(self.execution.trial_timeout_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.interpreter.probe_timeout_seconds)
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        for origin in &self.server.cors_origins {
            validation::validate_url("server.cors_origins", origin)?;
        }

        validation::validate_non_empty_string("interpreter.command", &self.interpreter.command)?;
        validation::validate_non_empty_string(
            "interpreter.helper_library",
            &self.interpreter.helper_library,
        )?;
        validation::validate_positive_number(
            "interpreter.probe_timeout_seconds",
            self.interpreter.probe_timeout_seconds,
            1,
        )?;

        validation::validate_path("scripts.root", &self.scripts.root)?;
        validation::validate_path("scripts.iris", &self.scripts.iris)?;
        validation::validate_path("scripts.spectrum", &self.scripts.spectrum)?;
        validation::validate_path("scripts.loom", &self.scripts.loom)?;

        validation::validate_positive_number(
            "execution.timeout_seconds",
            self.execution.timeout_seconds,
            1,
        )?;
        validation::validate_positive_number(
            "execution.trial_timeout_seconds",
            self.execution.trial_timeout_seconds,
            1,
        )?;
        validation::validate_positive_number(
            "execution.preview_chars",
            self.execution.preview_chars as u64,
            1,
        )?;

        Ok(())
    }
}
