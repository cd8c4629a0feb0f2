//! services/client/src/bin/hub.rs

use clap::Parser;
use client_lib::{
    adapters::HttpBackend,
    config::{Config, ConfigError},
    error::ClientError,
    presenter::TerminalPresenter,
    shell::Shell,
};
use knowledge_hub_core::{Credential, SessionController};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A terminal client for the AI Knowledge Hub backend.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Base URL of the backend (overrides BACKEND_URL).
    #[arg(long)]
    backend_url: Option<String>,

    /// Model to request for uploads (overrides DEFAULT_MODEL).
    #[arg(long)]
    model: Option<String>,

    /// Talk to a backend that does not check API keys.
    #[arg(long)]
    no_auth: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) -> Result<(), ConfigError> {
        if let Some(url) = self.backend_url {
            config.set_backend_url(&url)?;
        }
        if let Some(model) = self.model {
            config.default_model = Some(model);
        }
        if self.no_auth {
            config.require_auth = false;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    cli.apply(&mut config)?;

    // Logs go to stderr so they do not interleave with the session output.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Backend at {}", config.backend_url);

    // --- 2. Wire the Controller ---
    let backend = Arc::new(HttpBackend::new(
        config.backend_url.clone(),
        config.request_timeout,
    )?);
    let presenter = Arc::new(TerminalPresenter::stdout());
    let controller =
        SessionController::new(backend, presenter.clone(), config.controller_options());

    // --- 3. Optional Login From the Environment ---
    if let Some(key) = config.api_key.clone() {
        controller.authenticate(Credential::new(key)).await?;
    }

    // --- 4. Run the Shell ---
    presenter.line("AI Knowledge Hub. Type 'help' for commands.");
    if config.require_auth && config.api_key.is_none() {
        presenter.line("Start with: login <api-key>");
    }
    let mut shell = Shell::new(controller, presenter);
    shell.run(BufReader::new(tokio::io::stdin())).await?;

    info!("Goodbye.");
    Ok(())
}
