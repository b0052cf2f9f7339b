//! Simulation driver.
//!
//! Each block the driver:
//! 1. replays future operations whose target time has been reached,
//!    in target-time then enqueue order
//! 2. draws `ops_per_block` operations by weight and runs each against a
//!    fresh snapshot
//! 3. ends the block
//!
//! Operation errors are classified: skips count as no-ops, recoverable
//! failures are logged and counted, fatal failures stop the run.

use crate::accounts::{generate_accounts, genesis_for};
use crate::config::SimulatorConfig;
use crate::metrics::SimulationStats;
use crate::operations::{ErrorClass, Operation, OperationError};
use crate::registry::{default_operation_kinds, weighted_operations, AppParams, WeightedOperation};
use crate::scheduler::{FutureOperation, FutureOperationQueue};
use gravity_core::{SimApp, MODULE_NAME};
use gravity_simulation::{GenesisError, SimChain};
use gravity_types::SimAccount;
use hdrhistogram::CreationError;
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("invalid genesis: {0}")]
    Genesis(#[from] GenesisError),

    #[error("invalid operation weights: {0}")]
    Weights(#[from] WeightedError),

    #[error("failed to create metrics: {0}")]
    Metrics(#[from] CreationError),

    #[error("fatal failure at height {height}: {source}")]
    Fatal {
        height: u64,
        #[source]
        source: OperationError,
    },
}

/// Drives weighted random operations against a [`SimApp`].
pub struct Simulator<A: SimApp> {
    app: A,
    accounts: Vec<SimAccount>,
    chain_id: String,
    rng: ChaCha8Rng,
    operations: Vec<WeightedOperation>,
    selector: WeightedIndex<u32>,
    ops_per_block: usize,
    queue: FutureOperationQueue,
    stats: SimulationStats,
}

impl Simulator<SimChain> {
    /// Generate accounts, build the genesis chain and register every
    /// operation kind with the weights in `params`.
    pub fn from_config(config: &SimulatorConfig, params: &AppParams) -> Result<Self, SimulatorError> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let accounts = generate_accounts(&mut rng, config.num_accounts);
        let genesis = genesis_for(
            config.to_genesis_config(),
            &accounts,
            config.num_validators,
            config.initial_balance,
        );
        let chain = SimChain::new(genesis)?;
        let operations = weighted_operations(params, &default_operation_kinds());

        Simulator::new(
            chain,
            accounts,
            config.chain_id.clone(),
            operations,
            rng,
            config.ops_per_block,
        )
    }
}

impl<A: SimApp> Simulator<A> {
    pub fn new(
        app: A,
        accounts: Vec<SimAccount>,
        chain_id: String,
        operations: Vec<WeightedOperation>,
        rng: ChaCha8Rng,
        ops_per_block: usize,
    ) -> Result<Self, SimulatorError> {
        let selector = WeightedIndex::new(operations.iter().map(|w| w.weight))?;
        Ok(Self {
            app,
            accounts,
            chain_id,
            rng,
            operations,
            selector,
            ops_per_block,
            queue: FutureOperationQueue::new(),
            stats: SimulationStats::new()?,
        })
    }

    /// Run `blocks` blocks, stopping at the first fatal failure.
    pub fn run(&mut self, blocks: u64) -> Result<&SimulationStats, SimulatorError> {
        info!(
            module = MODULE_NAME,
            blocks,
            ops_per_block = self.ops_per_block,
            accounts = self.accounts.len(),
            "Starting simulation"
        );
        for _ in 0..blocks {
            self.step_block()?;
        }
        info!(
            blocks = self.stats.blocks(),
            operations = self.stats.total_operations(),
            pending_future_ops = self.queue.len(),
            "Simulation complete"
        );
        Ok(&self.stats)
    }

    /// Run one block.
    pub fn step_block(&mut self) -> Result<(), SimulatorError> {
        let now = self.app.block_time();
        for future in self.queue.pop_due(now) {
            self.stats
                .record_replay(now.saturating_sub(future.block_time));
            trace!(op = ?future.op, "Replaying future operation");
            self.run_operation(&future.op)?;
        }

        for _ in 0..self.ops_per_block {
            let idx = self.selector.sample(&mut self.rng);
            let op = self.operations[idx].op.clone();
            self.run_operation(&op)?;
        }

        self.app.end_block();
        self.stats.record_block();
        Ok(())
    }

    /// Queue an operation as if a generator had scheduled it.
    pub fn schedule(&mut self, future: FutureOperation) {
        self.stats.record_scheduled(1);
        self.queue.push(future);
    }

    fn run_operation(&mut self, op: &Operation) -> Result<(), SimulatorError> {
        let state = self.app.state();
        let height = self.app.block_height();
        let result = op.execute(
            &mut self.rng,
            &mut self.app,
            &state,
            &self.accounts,
            &self.chain_id,
        );

        match result {
            Ok(output) => {
                debug!(height, kind = %op.kind(), outcome = ?output.msg, "Operation done");
                self.stats.record(&output.msg);
                self.stats.record_scheduled(output.future_ops.len());
                self.queue.extend(output.future_ops);
                Ok(())
            }
            Err(e) => match e.class() {
                ErrorClass::Skip => {
                    trace!(height, error = %e, "Operation skipped");
                    self.stats.record(&e.no_op());
                    Ok(())
                }
                ErrorClass::Recoverable => {
                    warn!(height, error = %e, "Operation failed");
                    match &e {
                        OperationError::Deliver { kind, .. } => self.stats.record_rejection(*kind),
                        _ => self.stats.record_failure(e.kind()),
                    }
                    Ok(())
                }
                ErrorClass::Fatal => {
                    error!(height, error = %e, "Fatal operation failure");
                    Err(SimulatorError::Fatal { height, source: e })
                }
            },
        }
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    pub fn accounts(&self) -> &[SimAccount] {
        &self.accounts
    }

    pub fn operations(&self) -> &[WeightedOperation] {
        &self.operations
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn pending_future_operations(&self) -> usize {
        self.queue.len()
    }
}
