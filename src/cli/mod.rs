//! Command-line interface for Marketbook.

mod commands;

use clap::{Parser, Subcommand};

/// Marketbook - invoicing for small merchants
#[derive(Parser)]
#[command(name = "marketbook")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API and the maintenance scheduler (default)
    Serve,

    /// Create a default config file
    #[command(alias = "--init")]
    Init,

    /// Delete expired bearer tokens and admin grants
    PurgeTokens,

    /// Show recent audit history for an account
    #[command(alias = "h")]
    History {
        /// Account email
        email: String,
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        limit: u64,
    },
}

pub use commands::*;
