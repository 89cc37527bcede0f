//! reconx-node — the reconciliation engine's process entry point.
//!
//! Startup sequence:
//!   1. Load and validate configuration (defaults + optional file)
//!   2. Open the storage repository (sled-backed, or in-memory for `--ephemeral`)
//!   3. Wire source pullers — mock pullers unless/until real collaborators
//!      (IMAP, the bank API, the NLP extractor) are configured; see §6
//!   4. Wire the action dispatcher against its integration endpoints
//!   5. Start the orchestrator and idle until Ctrl-C, then stop gracefully
//!
//! The full JSON-RPC/chat-command surface that fronts this engine in
//! production is out of scope here (§1); this binary only boots the
//! core cycle so it is runnable standalone.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use reconx_actions::{ActionDispatcher, IntegrationConfig};
use reconx_core::config::Config;
use reconx_metrics::MetricsRegistry;
use reconx_orchestrator::{CycleDeps, Orchestrator};
use reconx_resilience::CircuitBreaker;
use reconx_sources::{EmailFilterConfig, MockEmailPuller, MockTransactionPuller, NullExtractor};
use reconx_orchestrator::TransactionSource;
use reconx_storage::{InMemoryRepository, Repository};

#[derive(Parser, Debug)]
#[command(
    name = "reconx-node",
    version,
    about = "reconx reconciliation engine — matches bank alert emails against transactions"
)]
struct Args {
    /// Directory for the persistent sled database.
    #[arg(long, default_value = "~/.reconx/data")]
    data_dir: PathBuf,

    /// Path to a JSON config file overlaying the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run with an in-memory repository instead of opening sled on disk.
    #[arg(long)]
    ephemeral: bool,

    /// Run a single cycle and exit instead of starting the ticking loop.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reconx=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("reconx-node starting");

    // ── Configuration ─────────────────────────────────────────────────────────
    let config = Config::load(args.config.as_deref()).context("loading configuration")?;

    // ── Storage ───────────────────────────────────────────────────────────────
    let repo: Arc<dyn Repository> = if args.ephemeral {
        info!("running with an in-memory repository — nothing will persist across restarts");
        Arc::new(InMemoryRepository::new())
    } else {
        let data_dir = expand_tilde(&args.data_dir);
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating data dir {}", data_dir.display()))?;
        Arc::new(
            reconx_storage::SledRepository::open(&data_dir)
                .with_context(|| format!("opening sled database at {}", data_dir.display()))?,
        )
    };

    // ── Source pullers ────────────────────────────────────────────────────────
    // Real email (IMAP + NLP extraction) and bank-API collaborators are
    // wired at the deployment layer, out of scope here (§6); the mock
    // pullers keep this binary runnable end to end without them.
    let email_puller = MockEmailPuller::new("inbox");
    let transaction_puller = MockTransactionPuller::new("bank");

    let deps = CycleDeps {
        email_puller: Box::new(email_puller),
        email_breaker: CircuitBreaker::new("inbox", config.circuit_breaker),
        extractor: Box::new(NullExtractor),
        transaction_sources: vec![TransactionSource {
            puller: Box::new(transaction_puller),
            breaker: CircuitBreaker::new("bank", config.circuit_breaker),
        }],
        repo: repo.clone(),
        dispatcher: Some(ActionDispatcher::new(
            repo.clone(),
            IntegrationConfig::default(),
            Duration::from_secs(config.orchestrator.action_timeout_secs),
        )),
        filter_config: EmailFilterConfig::default(),
    };

    let metrics = Arc::new(MetricsRegistry::new());

    if args.once {
        let record = reconx_orchestrator::run_cycle(&deps, &config).await?;
        info!(status = ?record.status, emails_matched = record.emails_matched, "single cycle complete");
        return Ok(());
    }

    let orchestrator = Orchestrator::start(deps, config, metrics);
    info!("node ready — running on the configured cycle interval");

    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    info!("shutdown requested, stopping orchestrator");
    orchestrator.stop().await;

    Ok(())
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
