use crate::core::dispatcher::OutcomeGroups;
use crate::domain::model::{
    AddressKey, LookupOutcome, MeteringPoint, MissingAddress, MissingPolicy, Product,
};
use std::collections::BTreeMap;

/// 尚未格式化的輸出資料
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRecord {
    Point {
        key: AddressKey,
        point: MeteringPoint,
    },
    /// 該產品查無資料 (只在 Placeholder 策略下產生)
    Placeholder {
        key: AddressKey,
        product: Product,
        street_number_addition: Option<String>,
        passthrough: BTreeMap<String, String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReducedBatch {
    pub records: Vec<RawRecord>,
    pub missing: Vec<MissingAddress>,
}

pub fn reduce(groups: OutcomeGroups, policy: MissingPolicy) -> ReducedBatch {
    let mut batch = ReducedBatch::default();

    for (key, results) in groups {
        let mut found_any = false;
        let mut empty_products = Vec::new();

        for result in results {
            match result.outcome {
                LookupOutcome::Found(points) => {
                    found_any = true;
                    batch
                        .records
                        .extend(points.into_iter().map(|point| RawRecord::Point {
                            key: key.clone(),
                            point,
                        }));
                }
                LookupOutcome::NotFound | LookupOutcome::TransportError(_) => {
                    empty_products.push(result.task);
                }
            }
        }

        if policy == MissingPolicy::Placeholder {
            for task in empty_products {
                batch.records.push(RawRecord::Placeholder {
                    key: key.clone(),
                    product: task.product,
                    street_number_addition: task.street_number_addition,
                    passthrough: task.passthrough,
                });
            }
        }

        if !found_any {
            tracing::warn!("⚠️ No metering points found for {}", key);
            batch.missing.push(MissingAddress::from(key));
        }
    }

    batch
}
