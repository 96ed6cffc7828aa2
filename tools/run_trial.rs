// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Run one saccade trial and print a JSON summary.
//!
//! ```text
//! listelos-trial --task sequence --seed 3
//! listelos-trial --task gap --gap 0.2 --debug-listelos-model
//! listelos-trial --config trial.toml --set step=0.0005 --set verbose=true
//! ```
//!
//! `--debug-<crate>` / `--debug-all` (or `LISTELOS_DEBUG`) raise the log level
//! for individual crates. Logs go to stderr; stdout carries only the summary.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser, ValueEnum};
use tracing::info;

use listelos::config::{apply_cli_overrides, apply_environment_overrides, load_config, TrialConfig};
use listelos::model::run_trial;
use listelos::observability::{
    debug_flags_help, init_logging, parse_debug_flags, LogFormat, LoggingConfig,
};
use listelos::TrialSummary;

/// Benchmark task presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Task {
    /// Four-cue memory-guided sequence
    Sequence,
    /// Visually guided saccade, working memory bypassed
    Gap,
    /// Sequence recall with working-memory microstimulation
    Stim,
    /// No cues, no stimulation
    Quiet,
}

/// Simulate one sequential saccade trial
#[derive(Parser, Debug)]
#[command(name = "listelos-trial", version, about, long_about = None)]
struct Args {
    /// Trial configuration file (TOML); takes precedence over --task
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Task preset used when no config file is given
    #[arg(long, value_enum, default_value_t = Task::Sequence)]
    task: Task,

    /// Gap between fixation offset and target onset for the gap task (seconds)
    #[arg(long, default_value_t = 0.0)]
    gap: f64,

    /// Stimulation site for the stim task (1-based)
    #[arg(long, default_value_t = 14)]
    stim_site: usize,

    /// Stimulation strength for the stim task
    #[arg(long, default_value_t = 0.5)]
    stim_strength: f64,

    /// Noise seed
    #[arg(long)]
    seed: Option<u64>,

    /// Report saccades and counting-cell updates at info level
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Override a configuration value, e.g. `--set step=0.0005`
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    overrides: Vec<(String, String)>,

    /// Console log format (text or json)
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Write JSON logs into a timestamped run folder under this directory
    /// (requires the `file-logging` feature)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Pretty-print the JSON summary
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn preset(args: &Args) -> TrialConfig {
    match args.task {
        Task::Sequence => TrialConfig::sequence_recall(),
        Task::Gap => TrialConfig::gap_saccade(args.gap),
        Task::Stim => TrialConfig::microstimulation(args.stim_site, 0.0, 1.0, args.stim_strength),
        Task::Quiet => TrialConfig::quiescent(2.0),
    }
}

fn build_config(args: &Args) -> Result<TrialConfig> {
    let overrides: HashMap<String, String> = args.overrides.iter().cloned().collect();

    let mut config = match &args.config {
        Some(path) => load_config(Some(path.as_path()), Some(&overrides))
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => {
            let mut config = preset(args);
            apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, &overrides)?;
            config
        }
    };

    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if args.verbose {
        config.simulation.verbose = true;
    }
    Ok(config)
}

fn main() -> Result<()> {
    // Debug flags are read before clap sees the arguments
    let debug_flags = parse_debug_flags();
    let matches = Args::command()
        .after_help(debug_flags_help())
        .get_matches_from(env::args().filter(|arg| !arg.starts_with("--debug-")));
    let args = Args::from_arg_matches(&matches)?;

    let format: LogFormat = args
        .log_format
        .parse()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let logging = LoggingConfig {
        format,
        log_dir: args.log_dir.clone(),
        ..LoggingConfig::default()
    };
    let guard = init_logging(&debug_flags, &logging)?;
    if let Some(dir) = guard.log_dir() {
        info!("Writing logs to {}", dir.display());
    }

    let config = build_config(&args)?;
    info!(
        "Running trial: {} cues, {} s at {} s step, seed {}",
        config.cues.len(),
        config.simulation.duration,
        config.simulation.step,
        config.simulation.seed
    );

    let output = run_trial(&config).context("Trial failed")?;
    let summary = TrialSummary::new(&config, &output);

    let json = if args.pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{}", json);
    Ok(())
}
