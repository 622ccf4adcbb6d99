use crate::domain::model::{MissingAddress, OutputRecord, ResolutionReport};
use crate::utils::error::{EanError, Result};
use serde::Serialize;
use std::collections::BTreeSet;

pub const RECORDS_FILE: &str = "metering_data.csv";
pub const MISSING_FILE: &str = "missing_addresses.csv";
pub const SUMMARY_FILE: &str = "resolution_summary.json";

const RECORD_COLUMNS: [&str; 7] = [
    "postalCode",
    "streetNumber",
    "streetNumberAddition",
    "bagId",
    "product",
    "ean",
    "specialMeteringPoint",
];

fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new())
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| EanError::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| EanError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn to_csv<T: Serialize>(rows: &[T], header: &[&str]) -> Result<String> {
    let mut writer = csv_writer();

    // 沒有資料時仍輸出表頭
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }

    into_string(writer)
}

/// 固定欄位之後接上輸入檔的額外欄位 (依名稱排序)，沒有值的格子留空
pub fn records_to_csv(records: &[OutputRecord]) -> Result<String> {
    let extra_columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.passthrough.keys().map(String::as_str))
        .filter(|name| !RECORD_COLUMNS.contains(name))
        .collect();

    let mut writer = csv_writer();
    writer.write_record(RECORD_COLUMNS.iter().chain(extra_columns.iter()))?;

    for record in records {
        let mut fields = vec![
            record.postal_code.clone(),
            record.street_number.to_string(),
            record.street_number_addition.clone().unwrap_or_default(),
            record.bag_id.clone().unwrap_or_default(),
            record.product.clone(),
            record.ean.clone().unwrap_or_default(),
            record
                .special_metering_point
                .map(|special| special.to_string())
                .unwrap_or_default(),
        ];
        fields.extend(
            extra_columns
                .iter()
                .map(|name| record.passthrough.get(*name).cloned().unwrap_or_default()),
        );
        writer.write_record(&fields)?;
    }

    into_string(writer)
}

pub fn missing_to_csv(missing: &[MissingAddress]) -> Result<String> {
    to_csv(missing, &["postalCode", "streetNumber"])
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    started_at: &'a chrono::DateTime<chrono::Utc>,
    finished_at: &'a chrono::DateTime<chrono::Utc>,
    duration_ms: i64,
    stats: &'a crate::domain::model::BatchStats,
    missing: &'a [MissingAddress],
}

pub fn summary_to_json(report: &ResolutionReport) -> Result<String> {
    let summary = Summary {
        started_at: &report.started_at,
        finished_at: &report.finished_at,
        duration_ms: (report.finished_at - report.started_at).num_milliseconds(),
        stats: &report.stats,
        missing: &report.missing,
    };
    Ok(serde_json::to_string_pretty(&summary)?)
}
