use crate::adapters::http::DEFAULT_REGISTRY_ENDPOINT;
use crate::core::ConfigProvider;
use crate::domain::model::{MissingPolicy, RetryPolicy};
use crate::utils::error::{EanError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_REGISTRY_ENDPOINT.to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub concurrent_requests: Option<usize>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    #[serde(default)]
    pub missing_policy: MissingPolicy,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./output".to_string(),
            missing_policy: MissingPolicy::default(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EanError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EanError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${EDSN_ENDPOINT})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EanError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("registry.endpoint", &self.registry.endpoint)?;
        if let Some(timeout) = self.registry.timeout_seconds {
            validation::validate_range("registry.timeout_seconds", timeout, 1, 300)?;
        }

        if self.input.path.trim().is_empty() {
            return Err(EanError::MissingConfigError {
                field: "input.path".to_string(),
            });
        }
        validation::validate_csv_extension("input.path", &self.input.path)?;
        validation::validate_non_empty_string("output.path", &self.output.path)?;
        validation::validate_path("output.path", &self.output.path)?;

        if let Some(concurrent) = self.dispatch.concurrent_requests {
            validation::validate_positive_number("dispatch.concurrent_requests", concurrent, 1)?;
        }
        if let Some(retries) = self.dispatch.retry_attempts {
            validation::validate_range("dispatch.retry_attempts", retries, 0, 10)?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn registry_endpoint(&self) -> &str {
        &self.registry.endpoint
    }

    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn concurrent_requests(&self) -> usize {
        self.dispatch.concurrent_requests.unwrap_or(8)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.registry.timeout_seconds.unwrap_or(30))
    }

    fn retry_policy(&self) -> RetryPolicy {
        let default = RetryPolicy::default();
        RetryPolicy {
            max_retries: self.dispatch.retry_attempts.unwrap_or(default.max_retries),
            base_delay: self
                .dispatch
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(default.base_delay),
        }
    }

    fn missing_policy(&self) -> MissingPolicy {
        self.output.missing_policy
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
