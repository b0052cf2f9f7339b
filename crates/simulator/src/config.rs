//! Configuration types for the simulator.

use gravity_simulation::GenesisConfig;
use std::time::Duration;

/// Configuration for a simulation run.
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    /// Chain identifier transactions are signed for.
    pub chain_id: String,

    /// Number of simulated accounts.
    pub num_accounts: usize,

    /// How many of the accounts are validators at genesis.
    pub num_validators: usize,

    /// Initial bond-denom balance for each account.
    pub initial_balance: u128,

    /// Number of blocks to run.
    pub blocks: u64,

    /// Weighted operations drawn per block, on top of replayed future operations.
    pub ops_per_block: usize,

    /// Time between blocks (simulated time).
    pub block_interval: Duration,

    /// Random seed for deterministic simulation.
    pub seed: u64,
}

impl SimulatorConfig {
    pub fn new(num_accounts: usize, num_validators: usize) -> Self {
        Self {
            chain_id: "gravity-sim-1".to_string(),
            num_accounts,
            num_validators: num_validators.min(num_accounts),
            initial_balance: 1_000_000,
            blocks: 100,
            ops_per_block: 10,
            block_interval: Duration::from_secs(5),
            seed: 12345,
        }
    }

    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = chain_id.into();
        self
    }

    pub fn with_initial_balance(mut self, balance: u128) -> Self {
        self.initial_balance = balance;
        self
    }

    pub fn with_blocks(mut self, blocks: u64) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn with_ops_per_block(mut self, ops: usize) -> Self {
        self.ops_per_block = ops;
        self
    }

    pub fn with_block_interval(mut self, interval: Duration) -> Self {
        self.block_interval = interval;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Genesis settings for the chain (accounts are added separately).
    pub fn to_genesis_config(&self) -> GenesisConfig {
        GenesisConfig::new(self.chain_id.clone()).with_block_interval(self.block_interval)
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new(20, 4)
    }
}
