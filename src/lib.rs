//! # sensor-dashboard
//!
//! Live sensor dashboard fed by a rosbridge websocket.
//!
//! The crate connects to a rosbridge server, subscribes to the `/gas` and
//! `/temp` topics, and derives a dashboard view from the latest reading of
//! each. When the link drops, it waits a fixed delay and tries to
//! reconnect exactly once.
//!
//! ## Architecture
//!
//! ```text
//! Terminal (render)
//!     │
//!     ├── DashboardSession (dashboard/)   owns connection, drives state
//!     │       ├── ReconnectPolicy (bridge/)
//!     │       └── DashboardView  (dashboard/)
//!     │
//!     ├── BridgeConnection (bridge/)      handshake, link task, ops
//!     │       └── TopicRouter + Subscriptions
//!     │
//!     └── rosbridge server  ◀── SensorFeeder (feeder/)
//! ```

pub mod bridge;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod feeder;
pub mod logging;
