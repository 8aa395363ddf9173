// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! keyslot - fetch, decrypt and cache a secret slot.
//!
//! This is the binary entry point. `get` serves the cached value according to
//! the configured strategy, `update` forces a refresh (run it from cron in
//! batch mode), and `status` reports the age of the cached record.

mod source;
mod status;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use keyslot_cache::{open_backend, CacheOrchestrator};
use keyslot_config::KeyslotConfig;
use keyslot_core::{KeyslotError, SecretSource};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::source::LazySlotSource;

/// Exit code when no value is available (batch mode without a record, or an
/// approval request that expired unanswered).
const EXIT_EMPTY: u8 = 2;
const EXIT_CANCELLED: u8 = 130;

/// keyslot - approval-gated secret slots with a local cache.
#[derive(Parser, Debug)]
#[command(name = "keyslot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the slot value as JSON, from the cache when possible.
    Get,
    /// Fetch the slot now and replace the cached record.
    Update,
    /// Show when the cached record was written and whether it is stale.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => keyslot_config::load_and_validate_path(path),
        None => keyslot_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            keyslot_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log.level);
    debug!(
        identifier = %config.slot.identifier,
        backend = ?config.cache.backend,
        strategy = %config.cache.strategy,
        "config loaded"
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let command = run(cli.command, config, cancel.clone());
    match run_until_cancelled(command, &cancel).await {
        Ok(code) => code,
        Err(KeyslotError::Cancelled) => {
            eprintln!("keyslot: cancelled");
            // A password prompt on the blocking pool would hold up runtime
            // shutdown until Enter is pressed.
            std::process::exit(i32::from(EXIT_CANCELLED));
        }
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("keyslot: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: Commands,
    config: KeyslotConfig,
    cancel: CancellationToken,
) -> Result<ExitCode, KeyslotError> {
    let cache = build_cache(config, cancel).await?;

    match command {
        Commands::Get => print_value(cache.get().await?),
        Commands::Update => match cache.update().await? {
            Some(_) => {
                eprintln!("keyslot: cache refreshed");
                Ok(ExitCode::SUCCESS)
            }
            None => {
                eprintln!("keyslot: no value received, cache unchanged");
                Ok(ExitCode::from(EXIT_EMPTY))
            }
        },
        Commands::Status { json } => {
            status::run_status(&cache, json).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Drive `command` unless `cancel` fires first. Covers every await point of
/// a command, not only approval polling.
async fn run_until_cancelled<F>(command: F, cancel: &CancellationToken) -> Result<ExitCode, KeyslotError>
where
    F: Future<Output = Result<ExitCode, KeyslotError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(KeyslotError::Cancelled),
        result = command => result,
    }
}

async fn build_cache(
    config: KeyslotConfig,
    cancel: CancellationToken,
) -> Result<CacheOrchestrator, KeyslotError> {
    let backend = open_backend(&config.cache).await?;
    let key = config.cache.key.clone();
    let ttl = Duration::from_secs(config.cache.ttl_secs);
    let strategy = config.cache.strategy;
    let source: Arc<dyn SecretSource> = Arc::new(LazySlotSource::new(config, cancel));

    Ok(CacheOrchestrator::new(backend, source, key, ttl, strategy))
}

fn print_value(value: Option<serde_json::Value>) -> Result<ExitCode, KeyslotError> {
    let Some(value) = value else {
        eprintln!("keyslot: no value available");
        return Ok(ExitCode::from(EXIT_EMPTY));
    };
    let out = serde_json::to_string_pretty(&value)
        .map_err(|e| KeyslotError::Internal(format!("failed to serialize value: {e}")))?;
    println!("{out}");
    Ok(ExitCode::SUCCESS)
}

/// Initialize the tracing subscriber. stdout carries the value, so logs go to
/// stderr.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keyslot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
