pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::{http::RegistryClient, storage::LocalStorage};
pub use crate::app::pipelines::ean_pipeline::EanPipeline;
pub use crate::config::toml_config::TomlConfig;
pub use crate::core::{
    etl::{EtlEngine, RunOutcome},
    resolver::EanResolver,
};
pub use crate::domain::model::{MissingPolicy, OutputRecord, ResolutionReport, RetryPolicy};
pub use crate::utils::error::{EanError, Result};
