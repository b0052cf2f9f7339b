//! Gravity Simulator CLI
//!
//! Runs a seeded random-operation simulation against an in-memory Gravity
//! chain and prints per-operation outcome counts.

use clap::Parser;
use gravity_simulator::{AppParams, Simulator, SimulatorConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gravity-sim")]
#[command(about = "Randomized operation simulator for the Gravity bridge")]
#[command(version)]
struct Cli {
    /// Random seed
    #[arg(long, default_value = "12345")]
    seed: u64,

    /// Number of blocks to run
    #[arg(long, default_value = "100")]
    blocks: u64,

    /// Weighted operations drawn per block
    #[arg(long, default_value = "10")]
    ops_per_block: usize,

    /// Number of simulated accounts
    #[arg(long, default_value = "20")]
    accounts: usize,

    /// How many accounts are validators at genesis
    #[arg(long, default_value = "4")]
    validators: usize,

    /// Initial bond-denom balance per account
    #[arg(long, default_value = "1000000")]
    balance: u128,

    /// JSON file with operation weights (e.g. {"op_weight_msg_send_to_ethereum": 100})
    #[arg(long)]
    params: Option<PathBuf>,

    /// Chain identifier
    #[arg(long, default_value = "gravity-sim-1")]
    chain_id: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let params = match &cli.params {
        Some(path) => AppParams::from_file(path)?,
        None => AppParams::new(),
    };
    let config = SimulatorConfig::new(cli.accounts, cli.validators)
        .with_chain_id(cli.chain_id)
        .with_initial_balance(cli.balance)
        .with_blocks(cli.blocks)
        .with_ops_per_block(cli.ops_per_block)
        .with_seed(cli.seed);

    let mut simulator = Simulator::from_config(&config, &params)?;
    let stats = simulator.run(config.blocks)?;
    println!("{stats}");
    Ok(())
}
