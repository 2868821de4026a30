//! Sensor feeder: publishes serial-monitor samples to the bridge.
//!
//! The feeder is the producer side of the dashboard. It reads the text
//! lines a sensor board prints, turns recognized ones into bridge
//! messages, and publishes them on their topics.

pub mod line;

use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub use line::{AMMONIA_ALERT_TEXT, SensorLine};

use crate::bridge::{BridgeConnection, FLOAT32_TYPE, STRING_TYPE, ScalarMessage, TextMessage};
use crate::config::BridgeConfig;
use crate::dashboard::TEMP_TOPIC;
use crate::error::BridgeError;

/// Topic carrying the analog ammonia level.
pub const AMMONIA_TOPIC: &str = "/ammonia";

/// Topic carrying ammonia alerts as text.
pub const AMMONIA_ALERT_TOPIC: &str = "/ammonia_alert";

/// Topics the feeder advertises, with their message types.
pub const FEEDER_TOPICS: [(&str, &str); 3] = [
    (TEMP_TOPIC, FLOAT32_TYPE),
    (AMMONIA_TOPIC, FLOAT32_TYPE),
    (AMMONIA_ALERT_TOPIC, STRING_TYPE),
];

impl SensorLine {
    /// Returns the topic this sample is published on.
    #[must_use]
    pub const fn topic(&self) -> &'static str {
        match self {
            Self::Temperature { .. } => TEMP_TOPIC,
            Self::Ammonia(_) => AMMONIA_TOPIC,
            Self::AmmoniaAlert => AMMONIA_ALERT_TOPIC,
        }
    }

    /// Returns the bridge message body.
    #[must_use]
    pub fn to_message(&self) -> serde_json::Value {
        match self {
            Self::Temperature { value, .. } | Self::Ammonia(value) => {
                json!(ScalarMessage { data: *value })
            }
            Self::AmmoniaAlert => json!(TextMessage {
                data: AMMONIA_ALERT_TEXT.to_string(),
            }),
        }
    }
}

/// Counters of one feeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Lines read.
    pub lines: u64,
    /// Samples published.
    pub published: u64,
    /// Recognized lines whose value failed to parse.
    pub rejected: u64,
}

/// Publishes sensor samples over one bridge connection.
#[derive(Debug)]
pub struct SensorFeeder {
    connection: BridgeConnection,
}

impl SensorFeeder {
    /// Connects to the bridge and advertises the feeder topics.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ConnectionFailure`] if the bridge is
    /// unreachable.
    pub async fn start(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let connection = BridgeConnection::new(config.url.clone());
        connection.connect().await?;
        for (topic, msg_type) in FEEDER_TOPICS {
            connection.advertise(topic, msg_type).await?;
        }
        tracing::info!(url = %config.url, "feeder connected");
        Ok(Self { connection })
    }

    /// Parses one line and publishes it if it carries a sample.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidSensorLine`] for unparseable values,
    /// or [`BridgeError::NotConnected`] if the link is gone.
    pub async fn feed_line(&self, line: &str) -> Result<Option<SensorLine>, BridgeError> {
        let Some(sample) = SensorLine::parse(line)? else {
            return Ok(None);
        };
        if matches!(sample, SensorLine::AmmoniaAlert) {
            tracing::warn!("critical ammonia level");
        }
        self.connection
            .publish(sample.topic(), sample.to_message())
            .await?;
        tracing::debug!(topic = sample.topic(), ?sample, "published sample");
        Ok(Some(sample))
    }

    /// Feeds every line of `reader` until end of input.
    ///
    /// Unparseable lines are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotConnected`] if the link goes away, or
    /// [`BridgeError::Input`] if reading the input fails.
    pub async fn run<R>(&self, reader: R) -> Result<FeedStats, BridgeError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut stats = FeedStats::default();
        let mut lines = reader.lines();
        loop {
            let Some(line) = lines.next_line().await? else {
                break;
            };
            stats.lines += 1;
            tracing::trace!(line = %line, "received line");
            match self.feed_line(&line).await {
                Ok(Some(_)) => stats.published += 1,
                Ok(None) => {}
                Err(e @ BridgeError::InvalidSensorLine { .. }) => {
                    tracing::error!(error = %e, "error processing sensor line");
                    stats.rejected += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(stats)
    }

    /// Flushes queued samples and closes the connection.
    pub async fn shutdown(self) -> bool {
        self.connection.close().await
    }
}
