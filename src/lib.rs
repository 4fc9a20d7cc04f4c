// Brawlr - Detection-to-event punch counting engine
// Module declarations

use clap::Parser;
use env_logger::Env;

pub mod acceptance;
pub mod cli;
pub mod clustering;
pub mod commands;
pub mod config;
pub mod events;
pub mod live;
pub mod pipeline;

use cli::{Cli, Commands};
use commands::{
    AnalysisResult, AnalyzeInput, CommandError, CommandResult, ReplayInput, ReplayResult,
};

/// Binary entry point; returns the process exit code
pub fn run() -> i32 {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    match execute(cli) {
        Ok(()) => 0,
        Err(e) => {
            log::error!("{}", e.message());
            1
        }
    }
}

fn execute(cli: Cli) -> CommandResult<()> {
    let mut config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { log, stride, trace } => {
            let result = commands::analyze_log(
                &config,
                AnalyzeInput {
                    log_path: log,
                    stride,
                    trace_path: trace,
                },
            )?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_analysis(&result);
            }
        }
        Commands::Live {
            log,
            fps,
            cooldown_ms,
            policy,
        } => {
            if let Some(cooldown_ms) = cooldown_ms {
                config.cooldown.cooldown_ms = cooldown_ms;
                config.validate()?;
            }

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|e| CommandError::from(format!("Failed to start runtime: {}", e)))?;

            let result = runtime.block_on(commands::replay_live(
                &config,
                ReplayInput {
                    log_path: log,
                    fps,
                    policy: policy.into(),
                },
            ))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_replay(&result);
            }
        }
    }

    Ok(())
}

fn print_analysis(result: &AnalysisResult) {
    let report = &result.report;
    println!("Source:   {} (sha256 {})", result.source, result.source_sha256);
    println!("Frames:   {}", result.frame_count);
    println!(
        "Regime:   {} (longest run {})",
        report.regime.display_name(),
        report.max_run_length
    );
    println!("Clusters: {}", report.cluster_count);
    for (class, count) in report.counts.iter() {
        println!("  {:<10} {}", class, count);
    }
    println!("Total:    {}", report.counts.total());
}

fn print_replay(result: &ReplayResult) {
    for event in &result.events {
        println!(
            "{}  frame {:>6}  {:<10} {:.2}",
            event.timestamp.to_rfc3339(),
            event.frame_index,
            event.class,
            event.confidence
        );
    }
    println!(
        "Session {}: {} frames",
        result.summary.session_id, result.summary.frames_processed
    );
    for (class, count) in result.summary.counts.iter() {
        println!("  {:<10} {}", class, count);
    }
    println!("Total: {}", result.summary.counts.total());
}
