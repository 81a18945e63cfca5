//! # ParaPool Operator Node
//!
//! Entry point for the `parapool-node` binary. Parses CLI arguments,
//! initializes logging and metrics, and serves the HTTP API over an
//! in-memory product registry.
//!
//! The binary supports three subcommands:
//!
//! - `run`     — start the API and metrics servers
//! - `demo`    — walk one product through its lifecycle on a scripted clock
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;
mod registry;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::RwLock;

use parapool_escrow::{Address, InsuranceFactory, ManualClock, Period, SystemClock};

use cli::{Commands, ParapoolCli};
use logging::LogFormat;
use metrics::NodeMetrics;
use registry::ProductRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ParapoolCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Demo(args) => run_demo(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the HTTP API and the metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "parapool_node=info,parapool_escrow=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        "starting parapool-node"
    );

    let node_metrics = Arc::new(NodeMetrics::new());

    let app_state = api::AppState {
        version: format!(
            "{} (escrow {})",
            env!("CARGO_PKG_VERSION"),
            parapool_escrow::config::PROTOCOL_VERSION,
        ),
        registry: Arc::new(RwLock::new(ProductRegistry::new())),
        clock: Arc::new(SystemClock),
        metrics: Arc::clone(&node_metrics),
        started_at: Utc::now(),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("parapool-node stopped");
    Ok(())
}

/// Walks one product through its full lifecycle on a manual clock and
/// prints the settlement summary to stdout.
fn run_demo(args: cli::DemoArgs) -> Result<()> {
    logging::init_logging("parapool_node=info,parapool_escrow=debug", LogFormat::Pretty);

    let investor = Address::from_bytes([0x11; 20]);
    let insuree = Address::from_bytes([0x22; 20]);
    let operator = Address::from_bytes([0x0A; 20]);

    // Signature window opens now and runs a day; coverage starts halfway
    // through it and runs a month.
    let start = Utc::now();
    let signature_period = Period::new(start, start + Duration::days(1));
    let insurance_period = Period::new(start + Duration::hours(12), start + Duration::days(31));
    let clock = ManualClock::new(start + Duration::hours(1));

    let mut factory = InsuranceFactory::new();
    let mut product = factory.create_insurance_for(
        operator,
        "Demo Investor Coin",
        "Demo Insuree Coin",
        insurance_period,
        signature_period,
        args.rate_percent,
    )?;

    product.invest(&clock, investor, args.investor_amount)?;
    product.insure(&clock, insuree, args.insuree_amount)?;

    // Jump past the coverage start, activate, and resolve.
    clock.set(start + Duration::hours(13));
    product.activate(&clock)?;
    product.close_case(args.case_happened)?;

    let vault = product.vault();
    println!("Demo product settled.");
    println!("  Vault          : {}", vault.address());
    println!("  Outcome        : case_happened = {}", args.case_happened);
    println!("  State          : {} (code {})", vault.current_state(), vault.state_code());
    println!("  Total deposits : {}", vault.total_deposits());

    if args.case_happened {
        let payout = product.claim_as_insuree(insuree)?;
        println!("  Insuree payout : {} -> {}", payout.amount, payout.payee);
    } else {
        let payout = product.claim_as_investor(investor)?;
        println!("  Investor refund: {} -> {}", payout.amount, payout.payee);
    }
    println!(
        "  Receipts       : investor {} / insuree {}",
        product.investor_coin().total_supply(),
        product.insuree_coin().total_supply(),
    );
    println!("  Funds held     : {}", product.vault().funds_held());

    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("parapool-node {}", env!("CARGO_PKG_VERSION"));
    println!("escrow        {}", parapool_escrow::config::PROTOCOL_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
