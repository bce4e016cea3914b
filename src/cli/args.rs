use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a task definition end-to-end against the in-memory reference collaborators
    Run {
        /// Path to a JSON task definition
        task_file: PathBuf,

        /// Shared secret used to sign the webhook request, if any
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Parse and validate a task definition file without executing it
    Validate {
        /// Path to a JSON task definition
        task_file: PathBuf,
    },
}
