use crate::core::reducer::RawRecord;
use crate::domain::model::{MissingAddress, OutputRecord};
use std::collections::BTreeMap;

/// 郵遞區號與門牌號碼沿用請求值，附加碼與 bagId 取自 registry 回應
pub fn format_record(raw: RawRecord) -> OutputRecord {
    match raw {
        RawRecord::Point { key, point } => OutputRecord {
            postal_code: key.postal_code,
            street_number: key.street_number,
            street_number_addition: point.street_number_addition,
            bag_id: point.bag_id,
            product: point.product,
            ean: Some(point.ean),
            special_metering_point: Some(point.special_metering_point),
            passthrough: BTreeMap::new(),
        },
        RawRecord::Placeholder {
            key,
            product,
            street_number_addition,
            passthrough,
        } => OutputRecord {
            postal_code: key.postal_code,
            street_number: key.street_number,
            street_number_addition,
            bag_id: None,
            product: product.as_str().to_string(),
            ean: None,
            special_metering_point: None,
            passthrough,
        },
    }
}

/// 依 (postalCode, streetNumber, streetNumberAddition, product) 排序，
/// 沒有附加碼的排在前面；平手時依 (ean, bagId, specialMeteringPoint) 排序，沒有 ean 的在前
pub fn sort_records(records: &mut Vec<OutputRecord>) {
    records.sort_by(|a, b| {
        (
            &a.postal_code,
            a.street_number,
            &a.street_number_addition,
            &a.product,
        )
            .cmp(&(
                &b.postal_code,
                b.street_number,
                &b.street_number_addition,
                &b.product,
            ))
            .then_with(|| {
                (&a.ean, &a.bag_id, a.special_metering_point, &a.passthrough).cmp(&(
                    &b.ean,
                    &b.bag_id,
                    b.special_metering_point,
                    &b.passthrough,
                ))
            })
    });
    records.dedup();
}

pub fn finalize(raw_records: Vec<RawRecord>) -> Vec<OutputRecord> {
    let mut records: Vec<OutputRecord> = raw_records.into_iter().map(format_record).collect();
    sort_records(&mut records);
    records
}

pub fn sort_missing(missing: &mut Vec<MissingAddress>) {
    missing.sort();
    missing.dedup();
}
