//! Tour player - runs a guided tour against a simulated tree camera
//!
//! Module structure:
//! - `domain/` - Tour definitions, stop states, blocks, errors
//! - `io/` - Ports and the player's adapters (camera, resolver, console)
//! - `services/` - The tour engine and its scheduling
//! - `infra/` - Config, metrics, diagnostics

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tour_engine::infra::{Config, Metrics, TracingDiagnostics};
use tour_engine::io::console::run_console;
use tour_engine::io::log_presentation::LogPresentation;
use tour_engine::io::tour_file::load_tour;
use tour_engine::io::{SimulatedCamera, StaticResolver};
use tour_engine::services::{Tour, TourCommand, TourHooks, TourPorts};
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Guided tour player with console control
#[derive(Parser, Debug)]
#[command(name = "tour-player", version, about)]
struct Args {
    /// Path to TOML configuration file (else TOUR_PLAYER_CONFIG, else config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Tour definition to play instead of the configured one
    #[arg(short, long)]
    tour: Option<String>,

    /// Start the tour immediately
    #[arg(long)]
    autostart: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    // RUST_LOG overrides; debug shows block changes and diagnostics
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_timer(UtcTime::rfc_3339())
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(UtcTime::rfc_3339())
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    info!(revision = env!("TOUR_ENGINE_REVISION"), "tour-player starting");

    let config = Config::load(args.config.as_deref()).with_autostart(args.autostart);
    let tour_file = args
        .tour
        .clone()
        .unwrap_or_else(|| config.tour_file().to_string());
    let setting = load_tour(&tour_file)?;

    info!(
        config_file = %config.config_file(),
        tour_file = %tour_file,
        stops = setting.stops.len(),
        flight_ms = %config.flight_ms(),
        fail_every = %config.fail_every(),
        targets = config.targets().len(),
        autostart = config.autostart(),
        "config_loaded"
    );

    let metrics = Arc::new(Metrics::new());
    let camera = Arc::new(
        SimulatedCamera::new(Duration::from_millis(config.flight_ms()))
            .with_fail_every(config.fail_every()),
    );
    let resolver = Arc::new(
        StaticResolver::new(config.targets().clone())
            .with_latency(Duration::from_millis(config.resolver_latency_ms())),
    );
    let identifiers = setting
        .stops
        .iter()
        .map(|stop| stop.identifier.clone().unwrap_or_default())
        .collect();
    let presentation = LogPresentation::new(identifiers, setting.dom_names.clone());

    let ports = TourPorts::new(camera)
        .with_resolver(resolver)
        .with_presentation(Box::new(presentation))
        .with_diagnostics(Arc::new(TracingDiagnostics))
        .with_metrics(metrics.clone());
    let hooks = TourHooks {
        on_start: Some(Arc::new(|| info!("tour_callback_start"))),
        on_exit: Some(Arc::new(|| info!("tour_callback_exit"))),
        ..TourHooks::default()
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (mut tour, events) = Tour::setup(setting, ports, hooks);
    let handle = tour.handle();

    if config.autostart() {
        handle.send(TourCommand::Start);
    }

    // Periodic metrics summary
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs().max(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(metrics_interval));
        interval.tick().await;
        loop {
            interval.tick().await;
            metrics_clone.report().log();
        }
    });

    let console_handle = handle.clone();
    let console_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        run_console(console_handle, console_shutdown).await;
    });

    // Handle shutdown on Ctrl+C
    let shutdown_signal = shutdown_tx;
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_signal.send(true);
    });

    tour.run(events, shutdown_rx).await;

    metrics.report().log();
    info!("tour-player shutdown complete");
    Ok(())
}
