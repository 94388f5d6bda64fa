// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! arx: run attack-surface scans from the command line.
//!
//! `arx scan` wires up a local store and worker, creates a scan for the
//! given target, and drives it to completion in-process. `arx validate`
//! checks an engine configuration without running anything.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arx", about = "Attack-surface scan orchestrator", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scan against one target on a local worker
    Scan {
        /// Target name: a domain, IP, or CIDR block
        #[arg(long)]
        target: String,
        /// Target kind
        #[arg(long, value_parser = ["domain", "ip", "cidr"], default_value = "domain")]
        kind: String,
        /// Engine configuration file (TOML)
        #[arg(long)]
        engine: PathBuf,
        /// Scan mode
        #[arg(long, value_parser = ["full", "quick"], default_value = "full")]
        mode: String,
        /// Base directory for scan results
        #[arg(long, default_value = "arx-results")]
        results_dir: PathBuf,
        /// Directory holding named wordlists
        #[arg(long, default_value = "wordlists")]
        wordlist_dir: PathBuf,
    },
    /// Parse and validate an engine configuration
    Validate {
        /// Engine configuration file (TOML)
        #[arg(long)]
        engine: PathBuf,
    },
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("ARX_LOG")
        .unwrap_or_else(|_| EnvFilter::new("arx_engine=info,arx_dispatch=info,warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Scan {
            target,
            kind,
            engine,
            mode,
            results_dir,
            wordlist_dir,
        } => commands::scan::run(target, kind, engine, mode, results_dir, wordlist_dir).await,
        Command::Validate { engine } => commands::validate::run(engine),
    }
}
