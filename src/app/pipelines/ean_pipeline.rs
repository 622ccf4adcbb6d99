use crate::adapters::http::RegistryClient;
use crate::core::export::{self, MISSING_FILE, RECORDS_FILE, SUMMARY_FILE};
use crate::core::ingest::parse_input_csv;
use crate::core::resolver::EanResolver;
use crate::core::{ConfigProvider, InputRow, Pipeline, RegistryLookup, ResolutionReport, Storage};
use crate::utils::error::Result;
use std::path::Path;
use std::sync::Arc;

pub struct EanPipeline<S: Storage, C: ConfigProvider, L: RegistryLookup + 'static> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) resolver: EanResolver<L>,
}

impl<S: Storage, C: ConfigProvider> EanPipeline<S, C, RegistryClient> {
    /// 使用真正的 EDSN registry 客戶端
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = RegistryClient::new(config.registry_endpoint(), config.request_timeout())?;
        Ok(Self::with_lookup(storage, config, Arc::new(client)))
    }
}

impl<S: Storage, C: ConfigProvider, L: RegistryLookup + 'static> EanPipeline<S, C, L> {
    pub fn with_lookup(storage: S, config: C, lookup: Arc<L>) -> Self {
        let resolver = EanResolver::new(
            lookup,
            config.concurrent_requests(),
            config.retry_policy(),
            config.missing_policy(),
        );
        Self {
            storage,
            config,
            resolver,
        }
    }

    fn output_file(&self, name: &str) -> String {
        Path::new(self.config.output_path())
            .join(name)
            .to_string_lossy()
            .into_owned()
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, L: RegistryLookup + 'static> Pipeline for EanPipeline<S, C, L> {
    async fn extract(&self) -> Result<Vec<InputRow>> {
        tracing::info!("📂 Reading addresses from: {}", self.config.input_path());
        let data = self.storage.read_file(self.config.input_path()).await?;
        parse_input_csv(&data)
    }

    async fn transform(&self, rows: Vec<InputRow>) -> Result<ResolutionReport> {
        tracing::debug!(
            "Resolving {} rows with missing policy {:?}",
            rows.len(),
            self.resolver.policy()
        );
        self.resolver.resolve(&rows).await
    }

    async fn load(&self, report: ResolutionReport) -> Result<String> {
        let records_csv = export::records_to_csv(&report.records)?;
        self.storage
            .write_file(&self.output_file(RECORDS_FILE), records_csv.as_bytes())
            .await?;

        if !report.missing.is_empty() {
            let missing_csv = export::missing_to_csv(&report.missing)?;
            self.storage
                .write_file(&self.output_file(MISSING_FILE), missing_csv.as_bytes())
                .await?;
        }

        let summary = export::summary_to_json(&report)?;
        self.storage
            .write_file(&self.output_file(SUMMARY_FILE), summary.as_bytes())
            .await?;

        tracing::debug!(
            "Wrote {} records and {} warnings",
            report.records.len(),
            report.missing.len()
        );
        Ok(self.config.output_path().to_string())
    }
}
