//! gitops-api - control plane for GitOps-managed clusters.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gitops_api::cli::output;
use gitops_api::cli::{execute, Cli, LogFormat};
use gitops_api::core::constants;
use gitops_api::error::{Error, WorkspaceError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env(constants::LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("gitops_api=debug")
        } else {
            EnvFilter::new("gitops_api=info")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    match cli.log_format {
        LogFormat::Json => registry.with(fmt::layer().json().with_writer(std::io::stderr)).init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init(),
    }

    if let Err(e) = execute(cli) {
        let suggestion = match &e {
            Error::Workspace(WorkspaceError::GitNotFound(_)) => {
                Some("install git and make sure it is on PATH")
            }
            Error::Config(_) => Some("check gitops-api.toml or pass --config"),
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
