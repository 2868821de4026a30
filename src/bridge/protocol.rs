//! rosbridge v2 wire messages.
//!
//! Every frame is a JSON object discriminated by its `op` field. Only the
//! operations the dashboard and the feeder need are modeled; any other op
//! decodes to [`BridgeOp::Other`] and is ignored by the link.

use serde::{Deserialize, Serialize};

/// Message-type tag of a single-precision float wrapper.
pub const FLOAT32_TYPE: &str = "std_msgs/Float32";

/// Message-type tag of a string wrapper.
pub const STRING_TYPE: &str = "std_msgs/String";

/// A rosbridge protocol operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BridgeOp {
    /// Client → server: start receiving messages for a topic.
    Subscribe {
        /// Client-chosen operation id, echoed by `unsubscribe`.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        id: Option<String>,
        /// Topic name (e.g. `/gas`).
        topic: String,
        /// Message-type tag (e.g. `std_msgs/Float32`).
        #[serde(rename = "type")]
        msg_type: String,
    },
    /// Client → server: stop receiving messages for a topic.
    Unsubscribe {
        /// Id of the matching `subscribe` op.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        id: Option<String>,
        /// Topic name.
        topic: String,
    },
    /// Client → server: announce that this client publishes a topic.
    Advertise {
        /// Client-chosen operation id.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        id: Option<String>,
        /// Topic name.
        topic: String,
        /// Message-type tag.
        #[serde(rename = "type")]
        msg_type: String,
    },
    /// Either direction: a message on a topic.
    Publish {
        /// Topic name.
        topic: String,
        /// Message body, shaped by the topic's message type.
        msg: serde_json::Value,
    },
    /// Any op this client does not handle (`status`, `service_response`, ...).
    #[serde(other)]
    Other,
}

impl BridgeOp {
    /// Encodes the op as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the message body cannot be
    /// serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the frame is not a JSON object
    /// with a string `op` field.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Body of a `std_msgs/Float32` message.
///
/// The value is kept as `f64` so the callback sees the number exactly as
/// the bridge serialized it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarMessage {
    /// The scalar payload.
    pub data: f64,
}

/// Body of a `std_msgs/String` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessage {
    /// The text payload.
    pub data: String,
}

/// Builds a rosbridge operation id of the form `<op>:<topic>:<uuid>`.
#[must_use]
pub fn op_id(op: &str, topic: &str) -> String {
    format!("{op}:{topic}:{}", uuid::Uuid::new_v4())
}
