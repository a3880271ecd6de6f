use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::constants::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(author, version, about = "Move an APRS object along a route via APRS-IS", long_about = None)]
pub struct Args {
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, help = "Path to config YAML file")]
    config: PathBuf,

    #[arg(short, long, help = "Enable verbose/debug logging", default_value_t = false)]
    verbose: bool,

    #[arg(long, help = "Print packets to stdout instead of transmitting", default_value_t = false)]
    dry_run: bool,

    #[arg(long, help = "Path to state file for restart resilience (JSON)")]
    state_file: Option<PathBuf>,

    #[arg(long, help = "Print a timing report on exit", default_value_t = false)]
    enable_timing: bool,

    #[arg(long, help = "Random seed for deterministic comment selection")]
    seed: Option<u64>,
}

impl Args {
    pub fn config(&self) -> &Path {
        &self.config
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn state_file(&self) -> Option<&Path> {
        self.state_file.as_deref()
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}
