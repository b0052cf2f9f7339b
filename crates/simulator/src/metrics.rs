//! Run statistics.

use gravity_core::{OperationKind, OperationMsg, MODULE_NAME};
use hdrhistogram::{CreationError, Histogram};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Outcome counts for one operation kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindStats {
    /// Delivered and applied.
    pub applied: u64,
    /// Delivered, rejected by a handler or by the transaction checks.
    pub rejected: u64,
    pub no_op: u64,
    /// Recoverable generator failures.
    pub failed: u64,
}

impl KindStats {
    pub fn total(&self) -> u64 {
        self.applied + self.rejected + self.no_op + self.failed
    }
}

/// Longest replay lag tracked precisely; longer lags are clamped.
const MAX_REPLAY_LAG_MS: u64 = 60 * 60 * 1_000;

/// Collects outcome counts and future-operation replay lag over a run.
pub struct SimulationStats {
    by_kind: BTreeMap<OperationKind, KindStats>,
    blocks: u64,
    future_scheduled: u64,
    future_replayed: u64,
    /// Milliseconds between a future operation's target time and its replay.
    replay_lag: Histogram<u64>,
}

impl SimulationStats {
    pub fn new() -> Result<Self, CreationError> {
        Ok(Self {
            by_kind: BTreeMap::new(),
            blocks: 0,
            future_scheduled: 0,
            future_replayed: 0,
            replay_lag: Histogram::new_with_bounds(1, MAX_REPLAY_LAG_MS, 3)?,
        })
    }

    pub fn record(&mut self, msg: &OperationMsg) {
        let stats = self.by_kind.entry(msg.kind()).or_default();
        match msg {
            OperationMsg::Delivered { applied: true, .. } => stats.applied += 1,
            OperationMsg::Delivered { applied: false, .. } => stats.rejected += 1,
            OperationMsg::NoOp { .. } => stats.no_op += 1,
        }
    }

    pub fn record_failure(&mut self, kind: OperationKind) {
        self.by_kind.entry(kind).or_default().failed += 1;
    }

    pub fn record_rejection(&mut self, kind: OperationKind) {
        self.by_kind.entry(kind).or_default().rejected += 1;
    }

    pub fn record_block(&mut self) {
        self.blocks += 1;
    }

    pub fn record_scheduled(&mut self, count: usize) {
        self.future_scheduled += count as u64;
    }

    pub fn record_replay(&mut self, lag: Duration) {
        self.future_replayed += 1;
        self.replay_lag
            .saturating_record(u64::try_from(lag.as_millis()).unwrap_or(u64::MAX));
    }

    pub fn kind(&self, kind: OperationKind) -> KindStats {
        self.by_kind.get(&kind).copied().unwrap_or_default()
    }

    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    pub fn total_operations(&self) -> u64 {
        self.by_kind.values().map(KindStats::total).sum()
    }

    pub fn future_scheduled(&self) -> u64 {
        self.future_scheduled
    }

    pub fn future_replayed(&self) -> u64 {
        self.future_replayed
    }

    /// Replay lag at `quantile`, in milliseconds.
    pub fn replay_lag_at(&self, quantile: f64) -> u64 {
        self.replay_lag.value_at_quantile(quantile)
    }
}

impl fmt::Display for SimulationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} blocks, {} operations",
            MODULE_NAME,
            self.blocks,
            self.total_operations()
        )?;
        writeln!(
            f,
            "{:<30} {:>8} {:>8} {:>8} {:>8}",
            "operation", "applied", "rejected", "no-op", "failed"
        )?;
        for kind in OperationKind::ALL {
            let s = self.kind(kind);
            writeln!(
                f,
                "{:<30} {:>8} {:>8} {:>8} {:>8}",
                kind.type_name(),
                s.applied,
                s.rejected,
                s.no_op,
                s.failed
            )?;
        }
        write!(
            f,
            "future operations: {} scheduled, {} replayed, lag p50 {}ms p99 {}ms",
            self.future_scheduled,
            self.future_replayed,
            self.replay_lag_at(0.5),
            self.replay_lag_at(0.99)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_outcome() {
        let mut stats = SimulationStats::new().unwrap();
        stats.record(&OperationMsg::no_op(OperationKind::RequestBatchTx, "nothing"));
        stats.record(&OperationMsg::no_op(OperationKind::RequestBatchTx, "nothing"));
        stats.record_failure(OperationKind::RequestBatchTx);
        stats.record_rejection(OperationKind::SendToEthereum);

        let batch = stats.kind(OperationKind::RequestBatchTx);
        assert_eq!(batch.no_op, 2);
        assert_eq!(batch.failed, 1);
        assert_eq!(stats.kind(OperationKind::SendToEthereum).rejected, 1);
        assert_eq!(stats.total_operations(), 4);
    }

    #[test]
    fn test_replay_lag() {
        let mut stats = SimulationStats::new().unwrap();
        stats.record_scheduled(2);
        stats.record_replay(Duration::from_secs(2));
        stats.record_replay(Duration::from_secs(4));
        assert_eq!(stats.future_replayed(), 2);
        assert!(stats.replay_lag_at(0.5) >= 1_990 && stats.replay_lag_at(0.5) <= 2_010);
        assert!(stats.replay_lag_at(1.0) >= 4_000 && stats.replay_lag_at(1.0) <= 4_010);

        let report = stats.to_string();
        assert!(report.starts_with("gravity: 0 blocks"));
        assert!(report.contains("2 scheduled, 2 replayed"));
    }

    #[test]
    fn test_replay_lag_beyond_range_is_clamped() {
        let mut stats = SimulationStats::new().unwrap();
        stats.record_replay(Duration::ZERO);
        stats.record_replay(Duration::from_secs(24 * 60 * 60));
        assert_eq!(stats.future_replayed(), 2);
        assert_eq!(stats.replay_lag_at(0.0), 0);
        assert!(stats.replay_lag_at(1.0) >= MAX_REPLAY_LAG_MS * 999 / 1_000);
    }
}
