//! Core seams for the Gravity operation simulator.
//!
//! Operation generators never touch chain storage directly. They read
//! through the keeper traits on a [`SimApp::State`] snapshot and write by
//! delivering signed transactions through [`SimApp::deliver`].

mod operation;
mod traits;

pub use operation::{OperationKind, OperationMsg, UnknownOperationKind, MODULE_NAME};
pub use traits::{
    AccountKeeper, BankKeeper, BridgeState, DeliverError, DeliverResult, GravityKeeper,
    KeeperError, SimApp, StakingKeeper,
};
