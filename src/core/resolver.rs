use crate::core::dispatcher::Dispatcher;
use crate::core::{expander, formatter, reducer};
use crate::domain::model::{
    BatchStats, InputRow, LookupOutcome, MissingPolicy, ResolutionReport, RetryPolicy,
};
use crate::domain::ports::RegistryLookup;
use crate::utils::error::Result;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;

/// 地址解析引擎：展開 → 並行查詢 → 合併 → 排序
pub struct EanResolver<L: RegistryLookup + 'static> {
    dispatcher: Dispatcher<L>,
    policy: MissingPolicy,
}

impl<L: RegistryLookup + 'static> EanResolver<L> {
    pub fn new(
        lookup: Arc<L>,
        max_concurrency: usize,
        retry: RetryPolicy,
        policy: MissingPolicy,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(lookup, max_concurrency, retry),
            policy,
        }
    }

    pub fn policy(&self) -> MissingPolicy {
        self.policy
    }

    /// 整批完成後才回傳
    pub async fn resolve(&self, rows: &[InputRow]) -> Result<ResolutionReport> {
        let started_at = Utc::now();

        let tasks = expander::expand_rows(rows);
        let mut stats = BatchStats {
            addresses: rows.iter().map(|r| &r.key).collect::<BTreeSet<_>>().len(),
            tasks: tasks.len(),
            ..Default::default()
        };

        let groups = self.dispatcher.dispatch(tasks).await?;

        for result in groups.values().flatten() {
            stats.retries += result.attempts.saturating_sub(1) as usize;
            match result.outcome {
                LookupOutcome::Found(_) => stats.found += 1,
                LookupOutcome::NotFound => stats.not_found += 1,
                LookupOutcome::TransportError(_) => stats.transport_errors += 1,
            }
        }

        let reduced = reducer::reduce(groups, self.policy);
        let records = formatter::finalize(reduced.records);
        let mut missing = reduced.missing;
        formatter::sort_missing(&mut missing);

        stats.records = records.len();
        stats.missing = missing.len();

        tracing::info!(
            "📊 Resolved {} addresses: {} records, {} missing, {} transport errors",
            stats.addresses,
            stats.records,
            stats.missing,
            stats.transport_errors
        );

        Ok(ResolutionReport {
            records,
            missing,
            stats,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
