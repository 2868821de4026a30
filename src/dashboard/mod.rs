//! Presentation layer: session ownership, readings, and the view model.
//!
//! The dashboard listens to two fixed topics, keeps the latest value of
//! each, and derives a static-plus-live view from them.

pub mod readings;
pub mod render;
pub mod session;
pub mod state;
pub mod view;

pub use readings::{GAS_TOPIC, LatestReadings, ScalarReading, SensorTopic, TEMP_TOPIC};
pub use render::render_view;
pub use session::DashboardSession;
pub use state::DashboardState;
pub use view::{DashboardView, health_percent};
