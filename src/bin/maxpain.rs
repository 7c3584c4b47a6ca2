//! Command-line entry point: one-shot or daily max-pain runs.
//!
//! # Usage
//!
//! ```sh
//! export POLYGON_API_KEY="your-api-key"
//! cargo run --bin maxpain -- --once --ticker SPY
//! cargo run --bin maxpain -- --daemon
//! cargo run --bin maxpain -- --demo --demo-price 450
//! cargo run --bin maxpain -- --history 30
//! ```
//!
//! Exit codes: `0` on success, `1` when a run fails, `2` on configuration
//! errors.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use chrono::{Duration, Utc};
use clap::Parser;
use rust_decimal::Decimal;
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use maxpain_rs::PolygonClient;
use maxpain_rs::config::Config;
use maxpain_rs::constants::LOG_FILE_NAME;
use maxpain_rs::demo::DemoChainFetcher;
use maxpain_rs::error::ConfigError;
use maxpain_rs::fetcher::{ChainFetcher, PolygonChainFetcher};
use maxpain_rs::report::ReportWriter;
use maxpain_rs::runner::Runner;
use maxpain_rs::scheduler::SystemClock;

const EXIT_CONFIG: u8 = 2;

/// Max-pain calculator for equity options chains.
#[derive(Parser)]
#[command(name = "maxpain", version, about)]
struct Cli {
    /// Run once and exit (default)
    #[arg(long, conflicts_with = "daemon")]
    once: bool,

    /// Run every trading day at RUN_AT until interrupted
    #[arg(long)]
    daemon: bool,

    /// Use a synthetic chain instead of the Polygon.io API
    #[arg(long)]
    demo: bool,

    /// Underlying price for --demo
    #[arg(long, default_value = "450")]
    demo_price: Decimal,

    /// Seed for --demo, for reproducible chains
    #[arg(long)]
    demo_seed: Option<u64>,

    /// Underlying symbol (overrides TICKER)
    #[arg(long)]
    ticker: Option<String>,

    /// Number of nearest expirations to analyze (overrides EXPIRATIONS)
    #[arg(long)]
    expirations: Option<usize>,

    /// Output directory (overrides DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Print history rows of the last DAYS days and exit
    #[arg(long, value_name = "DAYS", conflicts_with = "daemon")]
    history: Option<u32>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if let Err(e) = init_tracing(&config.log_dir) {
        eprintln!("cannot open log file in {}: {e}", config.log_dir.display());
        return ExitCode::from(EXIT_CONFIG);
    }

    if let Some(days) = cli.history {
        return print_history(&config, days);
    }

    let daemon = cli.daemon && !cli.once;

    if cli.demo {
        let fetcher = match cli.demo_seed {
            Some(seed) => DemoChainFetcher::seeded(cli.demo_price, config.market_timezone, seed),
            None => DemoChainFetcher::new(cli.demo_price, config.market_timezone),
        };
        tracing::info!(price = %cli.demo_price, "using demo data");
        return run(Runner::new(fetcher, &config), daemon).await;
    }

    let client = match config
        .api_key()
        .map_err(|e| e.to_string())
        .and_then(|key| PolygonClient::with_base_url(key.expose(), &config.base_url).map_err(|e| e.to_string()))
    {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "cannot build Polygon client");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    let fetcher = PolygonChainFetcher::new(client, config.market_timezone, config.contract_multiplier);
    run(Runner::new(fetcher, &config), daemon).await
}

async fn run<F: ChainFetcher>(runner: Runner<F>, daemon: bool) -> ExitCode {
    if daemon {
        return match runner.run_daemon(&SystemClock, shutdown_signal()).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "daemon stopped");
                ExitCode::FAILURE
            }
        };
    }

    match runner.run_once().await {
        Ok(report) => {
            print!("{}", runner.writer().render_text(&report));
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(ticker = %runner.ticker(), error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

/// Environment first, then command-line overrides.
fn build_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = Config::from_env()?;

    if let Some(ticker) = &cli.ticker {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(ConfigError::EmptyValue("--ticker".to_owned()));
        }
        config.ticker = ticker.to_uppercase();
    }
    if let Some(expirations) = cli.expirations {
        if expirations == 0 {
            return Err(ConfigError::Invalid {
                key: "--expirations".to_owned(),
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }
        config.expirations = expirations;
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

/// Stdout plus a plain-text copy appended to `<log_dir>/maxpain.log`.
fn init_tracing(log_dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(log_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILE_NAME))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
    Ok(())
}

fn print_history(config: &Config, days: u32) -> ExitCode {
    let today = Utc::now().with_timezone(&config.market_timezone).date_naive();
    let since = today - Duration::days(i64::from(days));
    let writer = ReportWriter::new(config.data_dir.clone(), config.market_timezone);

    let rows = match writer.load_history(&config.ticker, Some(since)) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "cannot read history");
            return ExitCode::FAILURE;
        }
    };

    if rows.is_empty() {
        println!("No history for {} since {since}", config.ticker);
        return ExitCode::SUCCESS;
    }

    println!(
        "{:<10}  {:<10}  {:>12}  {:>10}  {:>9}  {:>6}",
        "DATE", "EXPIRATION", "MAX PAIN", "PRICE", "DIST %", "P/C"
    );
    for row in rows {
        let ratio = row
            .put_call_ratio
            .map_or_else(|| "N/A".to_owned(), |r| format!("{r:.3}"));
        println!(
            "{:<10}  {:<10}  {:>12.2}  {:>10.2}  {:>9.2}  {:>6}",
            row.date, row.expiration, row.max_pain_strike, row.current_price, row.distance_percent, ratio
        );
    }
    ExitCode::SUCCESS
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
