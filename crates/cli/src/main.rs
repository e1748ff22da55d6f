//! Superscalar pipeline simulator CLI.
//!
//! This binary provides a single entry point for the simulator. It performs:
//! 1. **Run:** Parse an assembly program, simulate it to completion (or the
//!    cycle limit) and print the selected statistics sections or JSON.
//! 2. **Config:** Print the built-in configuration as JSON, as a starting
//!    point for a `--config` file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sspsim_core::common::error::SimError;
use sspsim_core::sim::{Program, Simulator, StopReason};
use sspsim_core::stats::STATS_SECTIONS;
use sspsim_core::Config;

#[derive(Parser, Debug)]
#[command(
    name = "sspsim",
    author,
    version,
    about = "Superscalar pipeline simulator",
    long_about = "Simulate an assembly program on a configurable out-of-order core with reservation stations, a scoreboard, a bypass network and a reorder buffer.\n\nExamples:\n  sspsim run programs/loop.s\n  sspsim run programs/loop.s --config wide.json --stats summary,hazards\n  sspsim run programs/loop.s --json > stats.json\n  sspsim config > default.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate an assembly program.
    Run {
        /// Assembly source, one instruction per line.
        program: PathBuf,

        /// JSON configuration file; built-in defaults when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override `general.max_cycles`.
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Log pipeline events (raises the log level to debug).
        #[arg(long)]
        trace: bool,

        /// Comma-separated statistics sections to print (summary, core,
        /// hazards, branch, memory); all when omitted.
        #[arg(long, value_delimiter = ',')]
        stats: Vec<String>,

        /// Print statistics as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Print the default configuration as JSON.
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let trace = matches!(cli.command, Commands::Run { trace: true, .. });
    init_logging(trace);

    let result = match cli.command {
        Commands::Run {
            program,
            config,
            max_cycles,
            stats,
            json,
            ..
        } => cmd_run(&program, config.as_deref(), max_cycles, &stats, json),
        Commands::Config => cmd_config(),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\n[!] FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Installs the `fmt` subscriber. `RUST_LOG` wins; otherwise `warn`, or
/// `debug` with `--trace`.
fn init_logging(trace: bool) {
    let fallback = if trace { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Loads the configuration and program, runs to completion and reports.
fn cmd_run(
    program_path: &std::path::Path,
    config_path: Option<&std::path::Path>,
    max_cycles: Option<u64>,
    sections: &[String],
    json: bool,
) -> Result<ExitCode, SimError> {
    let mut config = match config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(limit) = max_cycles {
        config.general.max_cycles = limit;
    }
    if let Some(bad) = sections
        .iter()
        .find(|s| !STATS_SECTIONS.contains(&s.as_str()))
    {
        eprintln!(
            "Unknown stats section `{bad}`; expected one of: {}",
            STATS_SECTIONS.join(", ")
        );
        return Ok(ExitCode::from(2));
    }

    let program = Program::from_file(program_path)?;
    if !json {
        println!("[*] Program: {} ({} instructions)", program_path.display(), program.len());
        println!(
            "    Issue width: {}  ROB: {}  RS: {}  Predictor: {:?}",
            config.pipeline.issue_width,
            config.pipeline.rob_size,
            config.pipeline.rs_size,
            config.branch_predictor.kind
        );
        println!();
    }

    let mut sim = Simulator::new(&config, program)?;
    let summary = sim.run();
    let stats = sim.stats();

    if json {
        match serde_json::to_string_pretty(&stats) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error serializing statistics: {e}");
                return Ok(ExitCode::FAILURE);
            }
        }
    } else {
        if summary.reason == StopReason::CycleLimit {
            println!(
                "[!] Stopped at the cycle limit ({} cycles) before the program drained",
                summary.cycles
            );
        }
        stats.print_sections(sections);
    }

    Ok(if summary.reason == StopReason::Completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(3)
    })
}

/// Prints the built-in configuration.
fn cmd_config() -> Result<ExitCode, SimError> {
    println!("{}", Config::default().to_json_pretty()?);
    Ok(ExitCode::SUCCESS)
}
