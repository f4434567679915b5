//! CLI definition using clap

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format for results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Parser)]
#[command(name = "plate-checker")]
#[command(version)]
#[command(about = "Check personalised plate availability on the EzyPlates service")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Max wait per session operation in seconds, overriding config
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Attempts per plate on transient failures, overriding config
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Seconds to pause between batch queries, overriding config
    #[arg(long, global = true)]
    pub delay: Option<u64>,

    /// Run the browser with a visible window
    #[arg(long, global = true)]
    pub no_headless: bool,

    /// Override the browser user agent string
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a single plate for availability
    Check {
        /// Plate to check (e.g. EZYPLTE)
        plate: String,
    },

    /// Check multiple plates, one after another
    Batch {
        /// Plates to check
        plates: Vec<String>,

        /// Read plates from a file, one per line; blank lines and `#`
        /// comments are skipped
        #[arg(long)]
        file: Option<PathBuf>,

        /// Write results to a CSV file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set the WebDriver endpoint
        #[arg(long)]
        set_webdriver_url: Option<String>,

        /// Set the query page entry URL
        #[arg(long)]
        set_entry_url: Option<String>,

        /// Set the per-operation timeout in seconds
        #[arg(long)]
        set_timeout: Option<u64>,

        /// Set attempts per plate on transient failures
        #[arg(long)]
        set_retries: Option<u32>,

        /// Set the delay between attempts in seconds
        #[arg(long)]
        set_backoff: Option<u64>,

        /// Set the pause between batch queries in seconds
        #[arg(long)]
        set_delay: Option<u64>,

        /// Enable/disable headless mode
        #[arg(long)]
        set_headless: Option<bool>,

        /// Set the user agent override (empty string clears it)
        #[arg(long)]
        set_user_agent: Option<String>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}
