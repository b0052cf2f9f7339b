//! Deterministic in-memory Gravity chain.
//!
//! This crate provides the application the operation simulator drives. It
//! implements the `gravity-core` keeper traits and [`SimApp`] with no I/O:
//! given the same genesis and the same transactions, it ends in the same
//! state every run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                       SimChain                          │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  deliver(Tx)                                       │ │
//! │  │  ante: chain id, sequence, signature, fee          │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  handlers on a scratch ChainState (im::OrdMap)     │ │
//! │  │  committed only if every message succeeds          │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  end_block: signer set refresh, height and time    │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! [`SimApp`]: gravity_core::SimApp

mod chain;
mod genesis;
mod handlers;
mod state;

pub use chain::SimChain;
pub use genesis::{GenesisAccount, GenesisConfig, GenesisDelegation, GenesisError};
pub use handlers::HandlerError;
pub use state::{ChainState, OutgoingTxKey};
