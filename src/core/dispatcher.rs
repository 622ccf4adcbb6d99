use crate::domain::model::{AddressKey, LookupOutcome, LookupTask, RetryPolicy, TaskResult};
use crate::domain::ports::RegistryLookup;
use crate::utils::error::{EanError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub type OutcomeGroups = BTreeMap<AddressKey, Vec<TaskResult>>;

/// 有上限的並行查詢派發器
///
/// 每次 `dispatch` 都建立自己的 semaphore 與 `JoinSet`；呼叫結束 (或 future 被丟棄) 時
/// `JoinSet` 會中止所有尚未完成的查詢。結果透過 join 回傳給單一收集迴圈，
/// 不會有多個 worker 同時寫入共享集合。
pub struct Dispatcher<L: RegistryLookup + 'static> {
    lookup: Arc<L>,
    max_concurrency: usize,
    retry: RetryPolicy,
}

impl<L: RegistryLookup + 'static> Dispatcher<L> {
    pub fn new(lookup: Arc<L>, max_concurrency: usize, retry: RetryPolicy) -> Self {
        Self {
            lookup,
            max_concurrency: max_concurrency.max(1),
            retry,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// 執行所有查詢，所有 task 都有最終結果後才回傳
    pub async fn dispatch(&self, tasks: Vec<LookupTask>) -> Result<OutcomeGroups> {
        let total = tasks.len();
        tracing::info!(
            "🚀 Dispatching {} lookups (max {} concurrent)",
            total,
            self.max_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut workers = JoinSet::new();
        let mut slots: Vec<Option<TaskResult>> = vec![None; total];

        for (index, task) in tasks.iter().enumerate() {
            let permit = semaphore.clone().acquire_owned().await.map_err(|e| {
                EanError::DispatchError {
                    message: format!("failed to acquire worker permit: {}", e),
                }
            })?;

            // 每個 worker 拿到自己的快照
            let snapshot = task.clone();
            let lookup = self.lookup.clone();
            let retry = self.retry;

            workers.spawn(async move {
                let _permit = permit;
                let (outcome, attempts) = lookup_with_retry(lookup.as_ref(), &snapshot, retry).await;
                (
                    index,
                    TaskResult {
                        task: snapshot,
                        outcome,
                        attempts,
                    },
                )
            });

            // 順手收掉已完成的結果
            while let Some(joined) = workers.try_join_next() {
                collect(joined, &mut slots);
            }
        }

        while let Some(joined) = workers.join_next().await {
            collect(joined, &mut slots);
        }

        let mut groups = OutcomeGroups::new();
        for (task, slot) in tasks.into_iter().zip(slots) {
            // worker panic 時沒有結果，視為傳輸錯誤而不是中止整批
            let result = slot.unwrap_or_else(|| {
                tracing::error!(
                    "💥 {} lookup worker for {} did not finish; recording transport error",
                    task.product,
                    task.key
                );
                TaskResult {
                    task: task.clone(),
                    outcome: LookupOutcome::TransportError("lookup worker panicked".to_string()),
                    attempts: 1,
                }
            });
            groups.entry(task.key).or_default().push(result);
        }

        tracing::info!(
            "✅ All {} lookups finished for {} addresses",
            total,
            groups.len()
        );
        Ok(groups)
    }
}

fn collect(
    joined: std::result::Result<(usize, TaskResult), tokio::task::JoinError>,
    slots: &mut [Option<TaskResult>],
) {
    match joined {
        Ok((index, result)) => slots[index] = Some(result),
        Err(join_error) => tracing::error!("Lookup worker failed: {}", join_error),
    }
}

async fn lookup_with_retry<L: RegistryLookup + ?Sized>(
    lookup: &L,
    task: &LookupTask,
    retry: RetryPolicy,
) -> (LookupOutcome, u32) {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        tracing::debug!("🔎 {} lookup for {} (attempt {})", task.product, task.key, attempt);
        let outcome = lookup.lookup(task).await;

        let retries_used = attempt - 1;
        if !outcome.is_transport_error() || retries_used >= retry.max_retries {
            return (outcome, attempt);
        }

        let delay = retry.delay_for(retries_used);
        tracing::debug!(
            "🔁 Retrying {} lookup for {} in {:?}",
            task.product,
            task.key,
            delay
        );
        tokio::time::sleep(delay).await;
    }
}
