use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 地址識別鍵：郵遞區號 + 門牌號碼，與產品無關
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressKey {
    pub postal_code: String,
    pub street_number: i64,
}

impl AddressKey {
    pub fn new(postal_code: impl Into<String>, street_number: i64) -> Self {
        Self {
            postal_code: postal_code.into(),
            street_number,
        }
    }
}

impl fmt::Display for AddressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.postal_code, self.street_number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Product {
    #[serde(rename = "ELK")]
    Elk,
    #[serde(rename = "GAS")]
    Gas,
}

impl Product {
    pub const ALL: [Product; 2] = [Product::Elk, Product::Gas];

    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Elk => "ELK",
            Product::Gas => "GAS",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 已解析的輸入列；其他欄位原樣保留
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    pub key: AddressKey,
    pub street_number_addition: Option<String>,
    pub passthrough: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTask {
    pub key: AddressKey,
    pub product: Product,
    pub street_number_addition: Option<String>,
    /// 輸入列的其他欄位，查無資料時原樣帶入輸出
    pub passthrough: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeteringPoint {
    pub ean: String,
    pub product: String,
    pub special_metering_point: bool,
    pub bag_id: Option<String>,
    /// 由 registry 回傳，可能與請求時的值不同
    pub street_number_addition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(Vec<MeteringPoint>),
    NotFound,
    TransportError(String),
}

impl LookupOutcome {
    pub fn is_transport_error(&self) -> bool {
        matches!(self, LookupOutcome::TransportError(_))
    }
}

/// 單一 task 的最終結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub task: LookupTask,
    pub outcome: LookupOutcome,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub postal_code: String,
    pub street_number: i64,
    pub street_number_addition: Option<String>,
    pub bag_id: Option<String>,
    pub product: String,
    pub ean: Option<String>,
    pub special_metering_point: Option<bool>,
    /// 輸入檔的額外欄位，只有佔位列會帶值
    #[serde(skip)]
    pub passthrough: BTreeMap<String, String>,
}

impl OutputRecord {
    pub fn address_key(&self) -> AddressKey {
        AddressKey::new(self.postal_code.clone(), self.street_number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingAddress {
    pub postal_code: String,
    pub street_number: i64,
}

impl From<AddressKey> for MissingAddress {
    fn from(key: AddressKey) -> Self {
        Self {
            postal_code: key.postal_code,
            street_number: key.street_number,
        }
    }
}

impl MissingAddress {
    pub fn address_key(&self) -> AddressKey {
        AddressKey::new(self.postal_code.clone(), self.street_number)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub addresses: usize,
    pub tasks: usize,
    pub found: usize,
    pub not_found: usize,
    pub transport_errors: usize,
    pub retries: usize,
    pub records: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionReport {
    pub records: Vec<OutputRecord>,
    pub missing: Vec<MissingAddress>,
    pub stats: BatchStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// 找不到資料時的處理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// 任一產品有結果就略過另一個產品
    #[default]
    Omit,
    /// 每個查無資料的產品都補一筆沒有 ean 的紀錄
    Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: std::time::Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: std::time::Duration::ZERO,
        }
    }

    /// 第 n 次重試前的等待時間 (指數退避)
    pub fn delay_for(&self, retry: u32) -> std::time::Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: std::time::Duration::from_millis(500),
        }
    }
}
