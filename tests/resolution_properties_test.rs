use async_trait::async_trait;
use ean_lookup::core::export::records_to_csv;
use ean_lookup::core::RegistryLookup;
use ean_lookup::domain::model::{
    AddressKey, InputRow, LookupOutcome, LookupTask, MeteringPoint, Product,
};
use ean_lookup::{EanResolver, MissingPolicy, RetryPolicy};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

/// 決定性的假 registry：依地址產生結果，並以可調整的延遲打亂完成順序
struct SyntheticRegistry {
    reverse_delays: bool,
}

impl SyntheticRegistry {
    fn outcome_for(task: &LookupTask) -> LookupOutcome {
        let n = task.key.street_number;
        match (n % 4, task.product) {
            // 兩個產品都有
            (0, product) => LookupOutcome::Found(vec![point(task, product, 1)]),
            // 只有電
            (1, Product::Elk) => {
                LookupOutcome::Found(vec![point(task, Product::Elk, 1), point(task, Product::Elk, 2)])
            }
            (1, Product::Gas) => LookupOutcome::NotFound,
            // 只有瓦斯，電的查詢失敗
            (2, Product::Elk) => LookupOutcome::TransportError("503".to_string()),
            (2, Product::Gas) => LookupOutcome::Found(vec![point(task, Product::Gas, 1)]),
            // 都沒有
            _ => LookupOutcome::NotFound,
        }
    }

    fn delay_for(&self, task: &LookupTask) -> Duration {
        let seed = (task.key.street_number as u64 * 7 + task.product as u64 * 3) % 11;
        let millis = if self.reverse_delays { 10 - seed } else { seed };
        Duration::from_millis(millis)
    }
}

fn point(task: &LookupTask, product: Product, index: u32) -> MeteringPoint {
    MeteringPoint {
        ean: format!("871{}{:04}{}{}", task.key.postal_code, task.key.street_number, product, index),
        product: product.as_str().to_string(),
        special_metering_point: index % 2 == 0,
        bag_id: Some(format!("bag-{}", task.key.street_number)),
        street_number_addition: task.street_number_addition.clone(),
    }
}

#[async_trait]
impl RegistryLookup for SyntheticRegistry {
    async fn lookup(&self, task: &LookupTask) -> LookupOutcome {
        tokio::time::sleep(self.delay_for(task)).await;
        Self::outcome_for(task)
    }
}

fn rows() -> Vec<InputRow> {
    (1..=24)
        .rev()
        .map(|n| InputRow {
            key: AddressKey::new(if n % 2 == 0 { "1000AA" } else { "2000BB" }, n),
            street_number_addition: if n % 3 == 0 { Some(format!("{}", n % 5)) } else { None },
            passthrough: BTreeMap::new(),
        })
        .collect()
}

fn resolver(reverse_delays: bool, policy: MissingPolicy) -> EanResolver<SyntheticRegistry> {
    EanResolver::new(
        Arc::new(SyntheticRegistry { reverse_delays }),
        5,
        RetryPolicy::none(),
        policy,
    )
}

#[tokio::test]
async fn test_every_address_is_covered_exactly() {
    let input = rows();
    let report = resolver(false, MissingPolicy::Omit).resolve(&input).await.unwrap();

    let input_keys: BTreeSet<AddressKey> = input.iter().map(|r| r.key.clone()).collect();
    let record_keys: BTreeSet<AddressKey> = report.records.iter().map(|r| r.address_key()).collect();
    let missing_keys: BTreeSet<AddressKey> = report.missing.iter().map(|m| m.address_key()).collect();

    // 同一地址不會同時出現在兩邊
    assert!(record_keys.is_disjoint(&missing_keys));
    let covered: BTreeSet<AddressKey> = record_keys.union(&missing_keys).cloned().collect();
    assert_eq!(covered, input_keys);

    // n % 4 == 3 的地址兩個產品都查無資料
    assert_eq!(report.missing.len(), 6);
    assert!(report.missing.iter().all(|m| m.street_number % 4 == 3));
}

#[tokio::test]
async fn test_partial_finds_produce_exact_record_counts() {
    let report = resolver(false, MissingPolicy::Omit).resolve(&rows()).await.unwrap();

    for n in 1..=24i64 {
        let count = report.records.iter().filter(|r| r.street_number == n).count();
        let expected = match n % 4 {
            0 => 2,
            1 => 2,
            2 => 1,
            _ => 0,
        };
        assert_eq!(count, expected, "street number {n}");
    }
}

#[tokio::test]
async fn test_output_independent_of_completion_order() {
    let input = rows();

    let forward = resolver(false, MissingPolicy::Omit).resolve(&input).await.unwrap();
    let backward = resolver(true, MissingPolicy::Omit).resolve(&input).await.unwrap();

    assert_eq!(
        records_to_csv(&forward.records).unwrap(),
        records_to_csv(&backward.records).unwrap()
    );
    assert_eq!(forward.missing, backward.missing);
}

#[tokio::test]
async fn test_output_is_sorted() {
    let report = resolver(true, MissingPolicy::Placeholder).resolve(&rows()).await.unwrap();

    let keys: Vec<_> = report
        .records
        .iter()
        .map(|r| {
            (
                r.postal_code.clone(),
                r.street_number,
                r.street_number_addition.clone(),
                r.product.clone(),
            )
        })
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[tokio::test]
async fn test_placeholder_policy_covers_every_product_pair() {
    let report = resolver(false, MissingPolicy::Placeholder).resolve(&rows()).await.unwrap();

    for n in 1..=24i64 {
        let products: BTreeSet<&str> = report
            .records
            .iter()
            .filter(|r| r.street_number == n)
            .map(|r| r.product.as_str())
            .collect();
        assert_eq!(products, BTreeSet::from(["ELK", "GAS"]), "street number {n}");
    }

    let placeholders = report.records.iter().filter(|r| r.ean.is_none()).count();
    // n%4==1 缺 GAS，n%4==2 缺 ELK，n%4==3 兩者皆缺
    assert_eq!(placeholders, 6 + 6 + 12);
    assert_eq!(report.missing.len(), 6);
}
