//! CLI entry point: config loading, logging init, the LIVE-mode
//! confirmation gate, and the orchestrator main loop. Grounded on the
//! `bog-bins` binaries' `CommonArgs`/`init_logging` split, generalized from
//! a single hardcoded strategy binary to one binary parameterized by
//! `Config`.

use anyhow::{bail, Context, Result};
use clap::Parser;
use mm_core::config::{Config, Mode};
use mm_core::dashboard::Dashboard;
use mm_core::exchange::http::{HttpAdapter, HttpAdapterConfig};
use mm_core::order_manager::OrderManager;
use mm_core::orchestrator::Orchestrator;
use mm_core::testing::SystemClock;
use std::io::BufRead;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "single-symbol perpetual futures market maker")]
struct Args {
    /// Path to a TOML config file; missing file falls back to defaults + env.
    #[arg(short, long)]
    config: Option<String>,

    /// Skip the LIVE-mode `YES` confirmation prompt.
    #[arg(long)]
    auto_confirm: bool,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,

    /// Disable the terminal dashboard (useful when piping stdout).
    #[arg(long)]
    no_dashboard: bool,
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
    Ok(())
}

fn confirm_live_mode() -> Result<()> {
    println!("LIVE mode will place real orders. Type YES to continue:");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read confirmation input")?;
    if line.trim() != "YES" {
        bail!("confirmation not given, aborting");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if args.auto_confirm {
        config.auto_confirm = true;
    }

    init_logging(&config.log_level, config.json_logs)?;

    tracing::info!(mode = ?config.mode, exchange = %config.exchange, coin = %config.coin, "starting market maker");

    if config.mode == Mode::Live && !config.auto_confirm {
        confirm_live_mode()?;
    }

    let adapter: Arc<dyn mm_core::exchange::ExchangeAdapter> = Arc::new(HttpAdapter::new(HttpAdapterConfig {
        rest_base_url: std::env::var("MM_REST_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
        ws_url: std::env::var("MM_WS_URL").ok(),
        api_key: std::env::var("MM_API_KEY").unwrap_or_default(),
        api_secret: std::env::var("MM_API_SECRET").unwrap_or_default(),
    }));

    let order_manager = match config.mode {
        Mode::Test => OrderManager::simulated(),
        Mode::Live => OrderManager::live(adapter.clone(), config.coin.clone()),
    };

    let dashboard = if args.no_dashboard {
        None
    } else {
        Dashboard::start().ok()
    };

    let mut orchestrator = Orchestrator::new(
        adapter,
        config.coin.clone(),
        config,
        order_manager,
        Arc::new(SystemClock),
        dashboard,
    );

    let shutdown = {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let tx = std::sync::Mutex::new(Some(tx));
        ctrlc::set_handler(move || {
            if let Some(tx) = tx.lock().unwrap().take() {
                let _ = tx.send(());
            }
        })
        .context("failed to install ctrl-c handler")?;
        rx
    };

    tokio::select! {
        result = orchestrator.run() => {
            if let Err(err) = result {
                tracing::error!(%err, "control loop exited with error");
                orchestrator.shutdown().await;
                std::process::exit(1);
            }
        }
        _ = shutdown => {
            tracing::info!("shutdown signal received, cancelling orders");
            orchestrator.shutdown().await;
        }
    }

    Ok(())
}
