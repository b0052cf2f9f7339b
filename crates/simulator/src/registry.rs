//! Weighted operation registry.
//!
//! Every operation kind gets exactly one weight: the value configured under
//! its weight key, or [`DEFAULT_WEIGHT`] when the key is absent. The registry
//! is built once per run.

use crate::operations::Operation;
use gravity_core::OperationKind;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Weight of an operation whose weight is not configured.
pub const DEFAULT_WEIGHT: u32 = 50;

/// Upper bound, in seconds, on how far ahead a follow-up operation is scheduled.
pub const MAX_WAIT_SECONDS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("failed to read params file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid params: {0}")]
    Json(#[from] serde_json::Error),
}

/// Simulation parameters: a flat JSON object of named values.
///
/// ```json
/// { "op_weight_msg_send_to_ethereum": 100, "op_weight_delegate_keys": 5 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppParams(IndexMap<String, serde_json::Value>);

impl AppParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, ParamsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn with_weight(mut self, kind: OperationKind, weight: u32) -> Self {
        self.0.insert(kind.weight_key().to_string(), weight.into());
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The value under `key`, or `generate()` when it is absent.
    ///
    /// A value that does not decode as `T` is logged and replaced too.
    pub fn get_or_generate<T: DeserializeOwned>(&self, key: &str, generate: impl FnOnce() -> T) -> T {
        match self.0.get(key) {
            Some(value) => match T::deserialize(value) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(key, %value, error = %e, "Ignoring malformed param");
                    generate()
                }
            },
            None => generate(),
        }
    }
}

/// An operation and its selection weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedOperation {
    pub weight: u32,
    pub op: Operation,
}

/// The operation kinds a gravity simulation registers, keyed by weight key.
pub fn default_operation_kinds() -> IndexMap<&'static str, OperationKind> {
    OperationKind::ALL
        .into_iter()
        .map(|kind| (kind.weight_key(), kind))
        .collect()
}

/// Resolve one weight per kind and pair it with the kind's operation.
///
/// A configured weight of zero is treated as unset.
pub fn weighted_operations(
    params: &AppParams,
    kinds: &IndexMap<&'static str, OperationKind>,
) -> Vec<WeightedOperation> {
    kinds
        .iter()
        .map(|(key, kind)| {
            let mut weight = params.get_or_generate(key, || DEFAULT_WEIGHT);
            if weight == 0 {
                warn!(key, "Zero weight configured, using default");
                weight = DEFAULT_WEIGHT;
            }
            debug!(%kind, weight, "Registered operation");
            WeightedOperation {
                weight,
                op: Operation::default_for(*kind),
            }
        })
        .collect()
}
