use crate::core::expander::normalize_addition;
use crate::domain::model::{AddressKey, InputRow};
use crate::utils::error::{EanError, Result};
use std::collections::BTreeMap;

pub const POSTAL_CODE_COLUMN: &str = "postalCode";
pub const STREET_NUMBER_COLUMN: &str = "streetNumber";
pub const ADDITION_COLUMN: &str = "streetNumberAddition";

/// 解析上傳的 CSV；缺少必要欄位時整批不執行
pub fn parse_input_csv(data: &[u8]) -> Result<Vec<InputRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut missing: Vec<String> = [POSTAL_CODE_COLUMN, STREET_NUMBER_COLUMN]
        .iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .map(|s| s.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(EanError::MissingColumnsError { missing });
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row_number = index + 1;

        let mut fields: BTreeMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();

        let postal_code = fields
            .remove(POSTAL_CODE_COLUMN)
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        if postal_code.is_empty() {
            return Err(EanError::InvalidRowError {
                row: row_number,
                field: POSTAL_CODE_COLUMN.to_string(),
                reason: "postal code is empty".to_string(),
            });
        }

        let raw_number = fields.remove(STREET_NUMBER_COLUMN).unwrap_or_default();
        let street_number = coerce_street_number(&raw_number).ok_or_else(|| {
            EanError::InvalidRowError {
                row: row_number,
                field: STREET_NUMBER_COLUMN.to_string(),
                reason: format!("'{}' is not an integer", raw_number),
            }
        })?;

        let street_number_addition = fields
            .remove(ADDITION_COLUMN)
            .and_then(|v| normalize_addition(Some(&v)));

        rows.push(InputRow {
            key: AddressKey::new(postal_code, street_number),
            street_number_addition,
            passthrough: fields,
        });
    }

    tracing::debug!("Parsed {} input rows", rows.len());
    Ok(rows)
}

/// 接受 "10"、" 10 " 與試算表匯出的 "10.0"
fn coerce_street_number(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    let f = trimmed.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
