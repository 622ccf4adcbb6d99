use crate::domain::model::{LookupOutcome, LookupTask, MeteringPoint};
use crate::domain::ports::RegistryLookup;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_REGISTRY_ENDPOINT: &str = "https://gateway.edsn.nl/eancodeboek/v1/ecbinfoset";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryResponse {
    /// 欄位缺少或為 null 都代表查無資料
    #[serde(default)]
    metering_points: Option<Vec<RegistryMeteringPoint>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryMeteringPoint {
    ean: String,
    product: String,
    #[serde(default)]
    special_metering_point: bool,
    bag_id: Option<String>,
    address: Option<RegistryAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryAddress {
    street_number_addition: Option<String>,
}

impl From<RegistryMeteringPoint> for MeteringPoint {
    fn from(raw: RegistryMeteringPoint) -> Self {
        Self {
            ean: raw.ean,
            product: raw.product,
            special_metering_point: raw.special_metering_point,
            bag_id: raw.bag_id,
            street_number_addition: raw.address.and_then(|a| a.street_number_addition),
        }
    }
}

/// EDSN EAN-codeboek 的 HTTP 客戶端
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    endpoint: String,
}

impl RegistryClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// 組出查詢；沒有附加碼時完全不送該參數，送空值會讓 registry 比對失敗
    pub fn build_request(&self, task: &LookupTask) -> Result<reqwest::Request> {
        let mut params: Vec<(&str, String)> = vec![
            ("product", task.product.as_str().to_string()),
            ("postalCode", task.key.postal_code.clone()),
            ("streetNumber", task.key.street_number.to_string()),
        ];
        if let Some(addition) = task
            .street_number_addition
            .as_deref()
            .filter(|a| !a.is_empty())
        {
            params.push(("streetNumberAddition", addition.to_string()));
        }

        Ok(self.client.get(&self.endpoint).query(&params).build()?)
    }

    async fn fetch(&self, task: &LookupTask) -> std::result::Result<LookupOutcome, String> {
        let request = self.build_request(task).map_err(|e| e.to_string())?;
        tracing::debug!("GET {}", request.url());

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(format!("registry answered with status {}", status));
        }

        let body: RegistryResponse = response
            .json()
            .await
            .map_err(|e| format!("malformed registry response: {}", e))?;

        let points = body.metering_points.unwrap_or_default();
        if points.is_empty() {
            Ok(LookupOutcome::NotFound)
        } else {
            Ok(LookupOutcome::Found(
                points.into_iter().map(MeteringPoint::from).collect(),
            ))
        }
    }
}

#[async_trait]
impl RegistryLookup for RegistryClient {
    async fn lookup(&self, task: &LookupTask) -> LookupOutcome {
        match self.fetch(task).await {
            Ok(outcome) => outcome,
            Err(reason) => {
                tracing::warn!(
                    "⚠️ {} lookup for {} failed: {}",
                    task.product,
                    task.key,
                    reason
                );
                LookupOutcome::TransportError(reason)
            }
        }
    }
}
