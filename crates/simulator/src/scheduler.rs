//! Future operations.
//!
//! A generator may ask for another operation to run later, e.g. a batch
//! request some seconds after a transfer. Scheduled operations are plain
//! data: the target block time plus the [`Operation`] to run, so a queue can
//! be logged, serialized and replayed.

use crate::operations::Operation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// An operation to run at or after `block_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FutureOperation {
    /// Target block time, as a duration since the Unix epoch.
    pub block_time: Duration,
    pub op: Operation,
}

impl FutureOperation {
    pub fn new(block_time: Duration, op: Operation) -> Self {
        Self { block_time, op }
    }
}

/// Pending future operations ordered by target time, then by enqueue order.
///
/// Nothing is ever cancelled: every entry is eventually returned by
/// [`FutureOperationQueue::pop_due`].
#[derive(Debug, Default)]
pub struct FutureOperationQueue {
    entries: BTreeMap<(Duration, u64), Operation>,
    next_seq: u64,
}

impl FutureOperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, future: FutureOperation) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert((future.block_time, seq), future.op);
    }

    /// Enqueue in iteration order.
    pub fn extend(&mut self, futures: impl IntoIterator<Item = FutureOperation>) {
        for future in futures {
            self.push(future);
        }
    }

    /// Remove and return every operation due at `now`, oldest target first.
    pub fn pop_due(&mut self, now: Duration) -> Vec<FutureOperation> {
        let mut due = Vec::new();
        while let Some(entry) = self.entries.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let ((block_time, _), op) = entry.remove_entry();
            due.push(FutureOperation { block_time, op });
        }
        due
    }

    /// Target time of the earliest pending operation.
    pub fn next_due(&self) -> Option<Duration> {
        self.entries.keys().next().map(|(t, _)| *t)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gravity_types::ConfirmationKind;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_ties_replay_in_insertion_order() {
        let mut queue = FutureOperationQueue::new();
        queue.push(FutureOperation::new(secs(5), Operation::RequestBatchTx { denom: None }));
        queue.push(FutureOperation::new(secs(5), Operation::CancelSendToEthereum));
        queue.push(FutureOperation::new(
            secs(5),
            Operation::SubmitEthereumTxConfirmation {
                confirmation: Some(ConfirmationKind::BatchTx),
            },
        ));

        let due = queue.pop_due(secs(5));
        let ops: Vec<_> = due.into_iter().map(|f| f.op).collect();
        assert_eq!(
            ops,
            vec![
                Operation::RequestBatchTx { denom: None },
                Operation::CancelSendToEthereum,
                Operation::SubmitEthereumTxConfirmation {
                    confirmation: Some(ConfirmationKind::BatchTx),
                },
            ]
        );
    }

    #[test]
    fn test_only_due_operations_are_popped() {
        let mut queue = FutureOperationQueue::new();
        queue.extend([
            FutureOperation::new(secs(10), Operation::EthereumHeightVote),
            FutureOperation::new(secs(3), Operation::DelegateKeys),
        ]);

        assert!(queue.pop_due(secs(2)).is_empty());
        assert_eq!(queue.next_due(), Some(secs(3)));

        let due = queue.pop_due(secs(9));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].op, Operation::DelegateKeys);
        assert_eq!(queue.len(), 1);

        let due = queue.pop_due(secs(100));
        assert_eq!(due[0].block_time, secs(10));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_future_operation_serializes() {
        let future = FutureOperation::new(
            secs(12),
            Operation::RequestBatchTx {
                denom: Some("stake".to_string()),
            },
        );
        let json = serde_json::to_string(&future).unwrap();
        let back: FutureOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, future);
    }
}
