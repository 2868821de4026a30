//! Serial-monitor line parsing.
//!
//! The sensor board prints one human-readable line per sample, e.g.
//! `Current Temperature: 23.50 C` or `Ammonia Level (Analog): 412`.
//! Matching is by substring, first match wins, in the order of the
//! [`SensorLine`] variants.

use crate::error::BridgeError;

/// Text published on the alert topic.
pub const AMMONIA_ALERT_TEXT: &str = "Critical Ammonia Level Detected";

/// One recognized sensor line.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorLine {
    /// A temperature sample in °C.
    Temperature {
        /// Parsed value.
        value: f64,
        /// `true` for `Simulated Temperature` lines.
        simulated: bool,
    },
    /// An analog ammonia level.
    Ammonia(f64),
    /// The board reported a critical ammonia level.
    AmmoniaAlert,
}

impl SensorLine {
    /// Parses one trimmed line.
    ///
    /// Returns `Ok(None)` for lines that carry no sample.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidSensorLine`] if a recognized line has
    /// no value or the value is not a number.
    pub fn parse(line: &str) -> Result<Option<Self>, BridgeError> {
        let line = line.trim();
        if line.contains("Current Temperature") {
            let value = first_word_value(line)?;
            Ok(Some(Self::Temperature {
                value,
                simulated: false,
            }))
        } else if line.contains("Simulated Temperature") {
            let value = first_word_value(line)?;
            Ok(Some(Self::Temperature {
                value,
                simulated: true,
            }))
        } else if line.contains("Ammonia Level (Analog)") {
            let raw = field(line)?;
            Ok(Some(Self::Ammonia(parse_number(line, raw)?)))
        } else if line.contains("Critical Ammonia Level") {
            Ok(Some(Self::AmmoniaAlert))
        } else {
            Ok(None)
        }
    }
}

/// Text after the first `": "` up to the next `": "`.
fn field(line: &str) -> Result<&str, BridgeError> {
    line.split(": ")
        .nth(1)
        .ok_or_else(|| BridgeError::InvalidSensorLine {
            line: line.to_string(),
            reason: "missing `: ` separator".to_string(),
        })
}

fn first_word_value(line: &str) -> Result<f64, BridgeError> {
    let raw = field(line)?;
    let word = raw.split(' ').next().unwrap_or(raw);
    parse_number(line, word)
}

fn parse_number(line: &str, raw: &str) -> Result<f64, BridgeError> {
    raw.trim()
        .parse()
        .map_err(|e: std::num::ParseFloatError| BridgeError::InvalidSensorLine {
            line: line.to_string(),
            reason: e.to_string(),
        })
}
