//! Kiosk entry point.
//!
//! Wires the chip reader, the booking backend client and the UI websocket
//! server together and runs the scan loop until Ctrl-C.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use kiosk_booking::{BookingOutcome, HttpBookingClient};
use kiosk_hardware::mock::{MockReader, MockReaderHandle};
use kiosk_hardware::{AnyReader, ChipReader, ConsoleReader};
use kiosk_session::ScanLoop;
use kiosk_ui::{UiHub, UiServer, UiSink};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .init();

    let config = Config::parse();
    run(config).await
}

async fn run(config: Config) -> Result<()> {
    let tunables = config
        .tunables()
        .context("Invalid timing configuration")?;
    let mode = config.session_mode();

    info!(version = kiosk_core::VERSION, %mode, "Starting kiosk");

    let api = Arc::new(
        HttpBookingClient::new(config.booking_config())
            .context("Failed to create booking client")?,
    );
    check_backend(&api).await;

    let hub = Arc::new(UiHub::new());
    let server = UiServer::bind(config.ui_config(), Arc::clone(&hub))
        .await
        .context("Failed to start UI server")?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            signal.cancel();
        }
    });

    let server_task = tokio::spawn(server.run(shutdown.clone()));

    // Keeps the demo reader's channel open for the lifetime of the process
    let (reader, _demo_handle) = build_reader(config.testing_mode);
    match reader.get_reader_info().await {
        Ok(info) => info!(reader = %info.name, protocols = ?info.protocols, "Chip reader ready"),
        Err(e) => warn!(error = %e, "Could not query chip reader"),
    }

    let sink: Arc<dyn UiSink> = hub;
    let scan_loop = ScanLoop::new(reader, api, sink, tunables, mode);
    scan_loop.run(shutdown.clone()).await;

    // Each UI connection shows its reconnect screen as it closes
    shutdown.cancel();
    server_task
        .await
        .context("UI server task failed")?
        .context("UI server stopped with an error")?;

    info!("Kiosk stopped");
    Ok(())
}

/// Pick the chip source.
///
/// The physical reader driver lives outside this workspace; without it the
/// kiosk runs on an idle mock reader and can only be driven through manual
/// entry.
fn build_reader(testing_mode: bool) -> (AnyReader, Option<MockReaderHandle>) {
    if testing_mode {
        info!("Testing mode: enter chip UIDs on standard input");
        return (AnyReader::Console(ConsoleReader::stdio()), None);
    }

    warn!("No chip reader driver available, falling back to the mock reader");
    let (reader, handle) = MockReader::with_name("Mock Reader".to_string());
    (AnyReader::Mock(reader), Some(handle))
}

/// Log whether the booking backend is reachable. Never fatal.
async fn check_backend(api: &HttpBookingClient) {
    match api.status().await {
        BookingOutcome::TransportFault(e) => {
            warn!(error = %e, "Booking backend not reachable, continuing anyway");
        }
        BookingOutcome::Malformed { message } => {
            warn!(%message, "Booking backend answered unexpectedly");
        }
        outcome => info!(kind = ?outcome.kind(), "Booking backend reachable"),
    }
}
