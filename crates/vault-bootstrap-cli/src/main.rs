//! CLI entry point for vault-bootstrap.
//!
//! Reads flags and `VAULT_ADDR`, builds the persistence backend and the vault
//! client, runs the bootstrap sequence once and maps its result to the
//! process exit code.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vault_bootstrap_core::config::DEFAULT_VAULT_ADDR;
use vault_bootstrap_core::{Bootstrapper, Outcome, VaultClient, store};

use crate::cli::Cli;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing("info");

    match run(&cli).await {
        Ok(outcome) if outcome.is_success() => {
            info!(%outcome, "vault bootstrap complete");
            ExitCode::SUCCESS
        }
        Ok(outcome) => {
            error!(%outcome, "failed to unseal vault");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "vault bootstrap aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<Outcome> {
    let vault_addr = vault_addr_from_env();
    let config = cli
        .to_config(&vault_addr)
        .context("invalid configuration")?;

    let store = store::open(&config.persistence)
        .await
        .context("failed to set up persistence")?;
    let client = VaultClient::new(&config.vault_addr).context("failed to build vault client")?;

    Bootstrapper::new(config, Arc::new(client), store)
        .run()
        .await
        .context("vault bootstrap failed")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `VAULT_ADDR`, or the loopback default when unset or empty.
fn vault_addr_from_env() -> String {
    std::env::var("VAULT_ADDR")
        .ok()
        .filter(|addr| !addr.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_VAULT_ADDR.to_string())
}

/// Initialize the tracing subscriber with the given default log level.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
