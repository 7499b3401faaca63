//! Command-line interface.

pub mod output;
pub mod seal;
pub mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::core::config::Config;
use crate::error::Result;

/// gitops-api - control plane for GitOps-managed clusters.
#[derive(Parser)]
#[command(
    name = "gitops-api",
    about = "Control-plane API for GitOps-managed clusters",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file
    #[arg(long, global = true, env = "GITOPS_API_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Log line format.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to listen on (overrides the config file and PORT)
        #[arg(long, env = "GITOPS_API_BIND")]
        bind: Option<String>,
    },

    /// Seal a value for a repository secret and print it base64-encoded
    Seal {
        /// Recipient public key, base64
        #[arg(long)]
        key: String,
        /// Read the value from this environment variable instead of stdin
        #[arg(long)]
        value_env: Option<String>,
    },
}

/// Execute a command.
pub fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve { bind } => {
            let path = cli.config.or_else(Config::default_path);
            let config = Config::load(path.as_deref())?;
            serve::execute(config, bind)
        }
        Command::Seal { key, value_env } => seal::execute(&key, value_env.as_deref()),
    }
}
