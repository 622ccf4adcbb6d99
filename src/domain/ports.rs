use crate::domain::model::{
    InputRow, LookupOutcome, LookupTask, MissingPolicy, ResolutionReport, RetryPolicy,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn registry_endpoint(&self) -> &str;
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn concurrent_requests(&self) -> usize;
    fn request_timeout(&self) -> Duration;
    fn retry_policy(&self) -> RetryPolicy;
    fn missing_policy(&self) -> MissingPolicy;
}

/// 對 EAN registry 的單次查詢；不可重試，也不可回傳錯誤
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    async fn lookup(&self, task: &LookupTask) -> LookupOutcome;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<InputRow>>;
    async fn transform(&self, rows: Vec<InputRow>) -> Result<ResolutionReport>;
    async fn load(&self, report: ResolutionReport) -> Result<String>;
}
