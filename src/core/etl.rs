use crate::core::Pipeline;
use crate::domain::model::MissingAddress;
use crate::utils::error::Result;
use std::time::Instant;

/// 一次批次執行的結果；警告與輸出表格分開回報
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub output_path: String,
    pub records: usize,
    pub missing: Vec<MissingAddress>,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        let started = Instant::now();
        tracing::info!("Starting EAN lookup batch...");

        // Extract
        let rows = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} address rows", rows.len());

        // Transform
        let report = self.pipeline.transform(rows).await?;
        tracing::info!(
            "🔧 Resolved {} records, {} addresses without metering points",
            report.records.len(),
            report.missing.len()
        );
        let records = report.records.len();
        let missing = report.missing.clone();

        // Load
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("💾 Output saved to: {} ({:?})", output_path, started.elapsed());

        Ok(RunOutcome {
            output_path,
            records,
            missing,
        })
    }
}
