//! `serve` command.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::cli::output;
use crate::core::config::Config;
use crate::core::document::YamlEditor;
use crate::core::pipeline::{Pipeline, PipelineSettings};
use crate::core::remote::GitHubConnector;
use crate::core::vcs::GitCli;
use crate::core::workspace::WorkspaceManager;
use crate::error::{ConfigError, Result};
use crate::server::{self, AppState};

/// Run the HTTP API until interrupted.
pub fn execute(config: Config, bind: Option<String>) -> Result<()> {
    let addr = resolve_bind(&config, bind, std::env::var("PORT").ok())?;

    let vcs = GitCli::from_config(&config)?;
    let connector = GitHubConnector::from_config(&config)?;
    let pipeline = Pipeline::new(
        PipelineSettings::from_config(&config),
        Arc::new(vcs),
        Arc::new(YamlEditor),
        WorkspaceManager::new(config.git.workspace_root.clone()),
    );
    let state = AppState::new(pipeline, Arc::new(connector));

    output::success(&format!("listening on {}", addr));
    output::kv("api", &config.github.api_url);
    output::kv("git", &config.github.git_url);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(address = %addr, "starting server");
        server::serve(listener, state).await
    })
}

/// Listen address: `--bind`, then `PORT` (all interfaces), then the config file.
fn resolve_bind(config: &Config, flag: Option<String>, port: Option<String>) -> Result<SocketAddr> {
    let raw = match (flag, port) {
        (Some(bind), _) => bind,
        (None, Some(port)) if !port.is_empty() => format!("0.0.0.0:{}", port),
        _ => config.server.bind.clone(),
    };
    raw.parse().map_err(|e| {
        ConfigError::InvalidValue {
            field: "bind",
            reason: format!("{}: {}", raw, e),
        }
        .into()
    })
}
