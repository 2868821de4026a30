//! Session-local state consumed by the view.

use serde::Serialize;

use super::readings::LatestReadings;

/// Everything the view needs, owned by the session driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardState {
    /// Whether the bridge link is up.
    pub connected: bool,
    /// Latest value per topic.
    pub readings: LatestReadings,
    /// Reconnect attempts started since mount.
    pub reconnect_attempts: u64,
}
