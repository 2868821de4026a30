//! sensor-dashboard entry point.
//!
//! Mounts a dashboard session, prints the rendered view on every change,
//! and unmounts on Ctrl-C.

use sensor_dashboard::config::AppConfig;
use sensor_dashboard::dashboard::{DashboardSession, render_view};
use sensor_dashboard::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env()?;

    // Initialize tracing
    init_tracing(config.log_format);
    tracing::info!(url = %config.bridge.url, "starting sensor-dashboard");

    let session = DashboardSession::mount(config.bridge);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
        }
        tracing::info!("shutting down");
    };
    session
        .render_until(shutdown, |view| println!("{}", render_view(view)))
        .await;

    let closed = session.unmount().await;
    tracing::info!(closed, "sensor-dashboard stopped");
    Ok(())
}
