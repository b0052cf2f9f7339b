//! Gravity Simulator
//!
//! A randomized operation simulator for the Gravity bridge module.
//! Draws weighted random gravity messages, signs and delivers them against a
//! [`SimApp`](gravity_core::SimApp), and replays follow-up operations at
//! later block times.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── Simulator ─────────────────────────────┐
//! │                                                                    │
//! │  registry ──► Vec<WeightedOperation> ──► WeightedIndex (ChaCha8Rng)│
//! │                                              │                     │
//! │  scheduler ◄── future ops ◄── operations ◄───┘                     │
//! │      │                         │    │                              │
//! │      └── due ops replayed ─────┘    ├── accounts (sampling)        │
//! │                                     └── signing (checkpoints)      │
//! └─────────────────────────────────────┬──────────────────────────────┘
//!                                       │ state() / deliver(tx)
//!                                       ▼
//!                                 SimApp (SimChain)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use gravity_simulator::{AppParams, Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(10, 3).with_seed(7);
//! let params = AppParams::new();
//! let mut simulator = Simulator::from_config(&config, &params)?;
//! let stats = simulator.run(config.blocks)?;
//! println!("{stats}");
//! ```

pub mod accounts;
pub mod config;
pub mod metrics;
pub mod operations;
pub mod registry;
pub mod runner;
pub mod scheduler;
pub mod signing;

pub use accounts::{random_account, random_validator};
pub use config::SimulatorConfig;
pub use metrics::{KindStats, SimulationStats};
pub use operations::{ErrorClass, Operation, OperationError, OperationOutput, NO_VALIDATOR};
pub use registry::{
    default_operation_kinds, weighted_operations, AppParams, ParamsError, WeightedOperation,
    DEFAULT_WEIGHT, MAX_WAIT_SECONDS,
};
pub use runner::{Simulator, SimulatorError};
pub use scheduler::{FutureOperation, FutureOperationQueue};
pub use signing::{verify_checkpoint_signature, CheckpointSigner};
