//! Command-line arguments.
//!
//! Every parameter flag is optional so that a value missing on the command
//! line can fall back to the config file, then to its default.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Observation-unit queueing simulation with Erlang B / C cross-checks.
#[derive(Parser, Debug)]
#[command(name = "obsim", version, about)]
pub struct Cli {
    /// YAML file with parameter values; command-line flags take precedence
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// DEBUG, INFO, WARNING, ERROR or CRITICAL (default WARNING)
    #[arg(long, global = true)]
    pub loglevel: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate Erlang-k random variates
    Rvs(RvsArgs),
    /// Run the unit simulation and compare against Erlang C
    Simulate(SimulateArgs),
    /// Evaluate Erlang B and Erlang C for a load and server count
    Erlang(ErlangArgs),
}

#[derive(Args, Debug, Default)]
pub struct RvsArgs {
    /// Number of stages in the Erlang distribution (default 1)
    #[arg(short = 'k')]
    pub k: Option<u32>,

    /// Overall mean of the distribution; each stage has mean b/k (default 1.0)
    #[arg(short = 'b')]
    pub b: Option<f64>,

    /// Number of variates to generate (default 1)
    #[arg(short = 'n')]
    pub n: Option<usize>,

    /// Random number generator seed
    #[arg(short = 's')]
    pub s: Option<u64>,

    /// Label used in output file names
    #[arg(long)]
    pub scenario: Option<String>,

    /// Output file; standard output when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct SimulateArgs {
    /// Arrival rate (entities per time unit)
    #[arg(long)]
    pub arr_rate: Option<f64>,

    /// Mean length of stay
    #[arg(long)]
    pub mean_los: Option<f64>,

    /// Erlang stages of the length of stay (default 1, exponential)
    #[arg(long)]
    pub los_stages: Option<u32>,

    /// Number of beds
    #[arg(short, long)]
    pub capacity: Option<usize>,

    /// Simulated run length (default 250)
    #[arg(long)]
    pub runtime: Option<f64>,

    /// Records at or before this time are left out of the statistics (default 0)
    #[arg(long)]
    pub warmup: Option<f64>,

    /// Random number generator seed
    #[arg(short = 's', long = "seed")]
    pub s: Option<u64>,

    /// Number of independent replications (default 1)
    #[arg(long = "reps")]
    pub num_replications: Option<u32>,

    /// Label used in output file names
    #[arg(long)]
    pub scenario: Option<String>,

    /// Directory for occupancy / stop logs and the summary table
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep ENTRY / EXIT records in the logs; `--egress=false` overrides the config file
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub egress: Option<bool>,
}

#[derive(Args, Debug, Default)]
pub struct ErlangArgs {
    /// Offered load in erlangs; computed from arr_rate * mean_los when omitted
    #[arg(long)]
    pub load: Option<f64>,

    #[arg(long)]
    pub arr_rate: Option<f64>,

    #[arg(long)]
    pub mean_los: Option<f64>,

    /// Number of servers
    #[arg(short, long)]
    pub capacity: Option<u32>,
}
