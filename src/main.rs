use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crash_alert_client::advisory::acquire_location_then_fetch;
use crash_alert_client::config::{CliArgs, DashboardConfig};
use crash_alert_client::connection::ConnectionManager;
use crash_alert_client::history::load_history;
use crash_alert_client::location::StaticLocationProvider;
use crash_alert_client::models::LocationCoordinate;
use crash_alert_client::render::ConsoleRenderer;
use crash_alert_client::state::{DashboardState, SharedState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crash_alert_client=info".into()),
        )
        .init();

    let args = CliArgs::parse();
    info!("Starting crash-alert-client v{}", env!("CARGO_PKG_VERSION"));

    let position = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Some(LocationCoordinate::new(lat, lon)),
        _ => None,
    };
    let location = Arc::new(StaticLocationProvider::new(position, args.deny_location));

    let config = DashboardConfig::from_args(args)?;
    info!("Server: {}", config.server_url);
    info!("Push channel: {}", config.ws_url);
    info!(
        "View: {:?} ({} notifications)",
        config.view, config.notification_capacity
    );

    let state: SharedState = Arc::new(DashboardState::new(
        config,
        Arc::new(ConsoleRenderer),
        location,
    ));

    // Push channel and advisory chain start together and run independently
    let connection = ConnectionManager::new(state.clone());
    connection.start().await?;

    let advisory_state = state.clone();
    tokio::spawn(async move {
        let _ = acquire_location_then_fetch(&advisory_state).await;
    });

    println!("Commands: h = reload history, w = refresh road conditions, q = quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(cmd)) => match cmd.trim() {
                    "h" => {
                        let state = state.clone();
                        tokio::spawn(async move {
                            load_history(&state).await;
                        });
                    }
                    "w" => {
                        let state = state.clone();
                        tokio::spawn(async move {
                            let _ = acquire_location_then_fetch(&state).await;
                        });
                    }
                    "q" => break,
                    "" => {}
                    other => warn!("Unknown command: {}", other),
                },
                Ok(None) => {
                    // stdin closed; keep rendering alerts until interrupted
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to wait for Ctrl+C: {}", e);
                    }
                    break;
                }
                Err(e) => {
                    error!("Failed to read command: {}", e);
                    break;
                }
            },
        }
    }

    info!("Stopping push channel...");
    connection.stop().await;
    info!("crash-alert-client shutting down");

    Ok(())
}
