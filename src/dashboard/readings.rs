//! Sensor topics and last-value-wins readings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Topic carrying the gas level.
pub const GAS_TOPIC: &str = "/gas";

/// Topic carrying the temperature in °C.
pub const TEMP_TOPIC: &str = "/temp";

/// The two topics the dashboard listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorTopic {
    /// `/gas`
    Gas,
    /// `/temp`
    Temperature,
}

impl SensorTopic {
    /// Both topics, in subscription order.
    pub const ALL: [Self; 2] = [Self::Gas, Self::Temperature];

    /// Returns the bridge topic name.
    #[must_use]
    pub const fn topic_name(self) -> &'static str {
        match self {
            Self::Gas => GAS_TOPIC,
            Self::Temperature => TEMP_TOPIC,
        }
    }
}

impl fmt::Display for SensorTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.topic_name())
    }
}

/// One received scalar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScalarReading {
    /// Topic the value arrived on.
    pub topic: SensorTopic,
    /// Raw value, unvalidated.
    pub value: f64,
    /// Local receive time.
    pub received_at: DateTime<Utc>,
}

impl ScalarReading {
    /// Creates a reading stamped with the current time.
    #[must_use]
    pub fn now(topic: SensorTopic, value: f64) -> Self {
        Self {
            topic,
            value,
            received_at: Utc::now(),
        }
    }
}

/// Latest reading per topic. No history is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatestReadings {
    gas: Option<ScalarReading>,
    temperature: Option<ScalarReading>,
}

impl LatestReadings {
    /// Replaces the reading for the topic of `reading`.
    pub fn apply(&mut self, reading: ScalarReading) {
        let slot = match reading.topic {
            SensorTopic::Gas => &mut self.gas,
            SensorTopic::Temperature => &mut self.temperature,
        };
        *slot = Some(reading);
    }

    /// Returns the latest reading for `topic`, if any arrived.
    #[must_use]
    pub const fn get(&self, topic: SensorTopic) -> Option<&ScalarReading> {
        match topic {
            SensorTopic::Gas => self.gas.as_ref(),
            SensorTopic::Temperature => self.temperature.as_ref(),
        }
    }

    /// Gas level, `0.0` until the first message.
    #[must_use]
    pub fn gas(&self) -> f64 {
        self.gas.map_or(0.0, |r| r.value)
    }

    /// Temperature, `0.0` until the first message.
    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature.map_or(0.0, |r| r.value)
    }
}
