//! # CLI Interface
//!
//! Defines the command-line argument structure for `parapool-node` using
//! `clap` derive. Supports three subcommands: `run`, `demo`, and
//! `version`.

use clap::{Parser, Subcommand};

use parapool_escrow::config::{DEFAULT_API_PORT, DEFAULT_METRICS_PORT};

/// ParaPool escrow operator node.
///
/// Hosts parametric-insurance products in memory and serves the query
/// and operation surface their front-ends poll: product state, deposit
/// totals, receipt-coin balances, and creation records.
#[derive(Parser, Debug)]
#[command(
    name = "parapool-node",
    about = "ParaPool escrow operator node",
    version,
    propagate_version = true
)]
pub struct ParapoolCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API and metrics servers.
    Run(RunArgs),
    /// Walk one product through its full lifecycle on a scripted clock
    /// and print the settlement summary.
    Demo(DemoArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the HTTP API.
    #[arg(long, env = "PARAPOOL_API_PORT", default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "PARAPOOL_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "PARAPOOL_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `demo` subcommand.
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Backing capital the demo investor deposits.
    #[arg(long, default_value_t = 100)]
    pub investor_amount: u64,

    /// Premium the demo insuree pays.
    #[arg(long, default_value_t = 40)]
    pub insuree_amount: u64,

    /// Capacity factor in percentage points (100 = one-to-one backing).
    #[arg(long, default_value_t = 100)]
    pub rate_percent: u64,

    /// Resolve the demo case as "the insured event happened".
    #[arg(long)]
    pub case_happened: bool,
}
