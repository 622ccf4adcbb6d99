pub mod toml_config;

use crate::adapters::http::DEFAULT_REGISTRY_ENDPOINT;
use crate::core::ConfigProvider;
use crate::domain::model::{MissingPolicy, RetryPolicy};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "ean-lookup")]
#[command(about = "Resolve EAN codes for a CSV of Dutch addresses")]
pub struct CliConfig {
    /// CSV with at least postalCode and streetNumber columns
    #[arg(short, long)]
    pub input: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = DEFAULT_REGISTRY_ENDPOINT)]
    pub registry_endpoint: String,

    #[arg(long, default_value = "8")]
    pub concurrent_requests: usize,

    #[arg(long, default_value = "30")]
    pub timeout_seconds: u64,

    /// Retries per lookup after a transport error (0 disables)
    #[arg(long, default_value = "2")]
    pub retry_attempts: u32,

    #[arg(long, default_value = "500")]
    pub retry_delay_ms: u64,

    #[arg(long, value_enum, default_value = "omit")]
    pub missing_policy: MissingPolicy,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn registry_endpoint(&self) -> &str {
        &self.registry_endpoint
    }

    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry_attempts,
            base_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    fn missing_policy(&self) -> MissingPolicy {
        self.missing_policy
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input)?;
        validation::validate_csv_extension("input", &self.input)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_url("registry_endpoint", &self.registry_endpoint)?;
        validation::validate_range("concurrent_requests", self.concurrent_requests, 1, 64)?;
        validation::validate_range("timeout_seconds", self.timeout_seconds, 1, 300)?;
        validation::validate_range("retry_attempts", self.retry_attempts, 0, 10)?;
        Ok(())
    }
}
