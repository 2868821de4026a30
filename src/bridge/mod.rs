//! rosbridge client layer: connection, subscriptions, reconnect policy.
//!
//! The bridge speaks the rosbridge v2 JSON protocol over a websocket. It
//! knows nothing about the dashboard; it only moves scalar messages from
//! topics to callbacks and ops from the caller to the wire.

pub mod connection;
pub mod protocol;
pub mod reconnect;
pub mod router;
pub mod subscription;

pub use connection::{BridgeConnection, ConnectionEvent, ConnectionState};
pub use protocol::{BridgeOp, FLOAT32_TYPE, STRING_TYPE, ScalarMessage, TextMessage};
pub use reconnect::{ReconnectPolicy, ReconnectState};
pub use router::TopicRouter;
pub use subscription::{Subscription, SubscriptionId};
