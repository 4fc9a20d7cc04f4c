// Command-line interface
// Argument definitions for the brawlr binary

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::acceptance::PolicyKind;

/// Brawlr - count punches from per-frame detector output
#[derive(Parser, Debug)]
#[command(name = "brawlr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine config file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count events in a completed video's frame log
    Analyze {
        /// Frame log to analyze
        log: PathBuf,

        /// Frame stride the log was sampled at
        #[arg(short, long)]
        stride: Option<usize>,

        /// Append the decision trace to this JSONL file
        #[arg(short, long)]
        trace: Option<PathBuf>,
    },

    /// Replay a frame log as a live session
    Live {
        /// Frame log to replay
        log: PathBuf,

        /// Frames per second used to synthesize timestamps
        #[arg(long, default_value = "30")]
        fps: f64,

        /// Override the configured cooldown
        #[arg(long)]
        cooldown_ms: Option<u64>,

        /// Acceptance policy for the session
        #[arg(short, long, value_enum, default_value_t = PolicyArg::Cooldown)]
        policy: PolicyArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyArg {
    Cooldown,
    Cluster,
}

impl From<PolicyArg> for PolicyKind {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Cooldown => PolicyKind::Cooldown,
            PolicyArg::Cluster => PolicyKind::ClusterMajority,
        }
    }
}
