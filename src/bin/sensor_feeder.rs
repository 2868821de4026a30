//! sensor-feeder entry point.
//!
//! Reads serial-monitor lines from stdin and publishes recognized samples
//! to the bridge, e.g. `cat /dev/ttyUSB0 | sensor-feeder`.

use tokio::io::BufReader;

use sensor_dashboard::config::AppConfig;
use sensor_dashboard::feeder::SensorFeeder;
use sensor_dashboard::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);
    tracing::info!(url = %config.bridge.url, "starting sensor-feeder");

    let feeder = SensorFeeder::start(&config.bridge).await?;
    let stats = feeder.run(BufReader::new(tokio::io::stdin())).await;
    feeder.shutdown().await;

    let stats = stats?;
    tracing::info!(
        lines = stats.lines,
        published = stats.published,
        rejected = stats.rejected,
        "input exhausted"
    );
    Ok(())
}
