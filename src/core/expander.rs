use crate::domain::model::{InputRow, LookupTask, Product};

/// 試算表匯出時代表「沒有值」的字串
const NULL_MARKERS: [&str; 4] = ["nan", "none", "null", "<na>"];

/// 空字串或「非值」一律視為沒有門牌附加碼，避免送出空的查詢參數
pub fn normalize_addition(raw: Option<&str>) -> Option<String> {
    let value = raw?.trim();
    if value.is_empty() || NULL_MARKERS.contains(&value.to_ascii_lowercase().as_str()) {
        None
    } else {
        Some(value.to_string())
    }
}

/// 每一列展開成 ELK 與 GAS 兩個查詢
pub fn expand_row(row: &InputRow) -> [LookupTask; 2] {
    let addition = normalize_addition(row.street_number_addition.as_deref());
    Product::ALL.map(|product| LookupTask {
        key: row.key.clone(),
        product,
        street_number_addition: addition.clone(),
        passthrough: row.passthrough.clone(),
    })
}

pub fn expand_rows(rows: &[InputRow]) -> Vec<LookupTask> {
    rows.iter().flat_map(expand_row).collect()
}
