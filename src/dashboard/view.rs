//! Dashboard view model.
//!
//! [`DashboardView`] is a pure function of [`DashboardState`]. The charts
//! and most stat cards are static illustrative data; only the machine
//! health card and the system status panel follow live readings.

use serde::Serialize;

use super::state::DashboardState;

/// Page title.
pub const DASHBOARD_TITLE: &str = "Company Dashboard";

/// One headline number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatCard {
    /// Card heading.
    pub title: &'static str,
    /// Display value.
    pub value: String,
}

/// Chart flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Vertical bars.
    Bar,
    /// Pie slices.
    Pie,
}

/// Input of one chart widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartData {
    /// Panel heading.
    pub title: &'static str,
    /// Chart flavor.
    pub kind: ChartKind,
    /// Category labels.
    pub labels: &'static [&'static str],
    /// Dataset legend label, if any.
    pub series_label: Option<&'static str>,
    /// One value per label.
    pub values: &'static [u32],
    /// Y-axis caption for bar charts.
    pub y_axis_title: Option<&'static str>,
}

impl ChartData {
    /// Iterates `(label, value)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        self.labels.iter().copied().zip(self.values.iter().copied())
    }

    /// Sum of all values.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.values.iter().sum()
    }
}

/// Workforce headcount per shift.
pub const WORKFORCE_BY_TIME: ChartData = ChartData {
    title: "Workforce vs Time of the Day",
    kind: ChartKind::Bar,
    labels: &["Morning", "Afternoon", "Evening"],
    series_label: Some("Workforce"),
    values: &[5, 12, 8],
    y_axis_title: Some("Number of Workers"),
};

/// Current worker activity split.
pub const WORKER_STATUS: ChartData = ChartData {
    title: "Worker Status",
    kind: ChartKind::Pie,
    labels: &["Active", "Rest", "Not Working"],
    series_label: None,
    values: &[9, 3, 5],
    y_axis_title: None,
};

/// Live connection and readings panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemStatus {
    /// Whether the bridge link is up.
    pub connected: bool,
    /// `Connected` or `Disconnected`.
    pub label: &'static str,
    /// Gas level with two decimals.
    pub gas_level: String,
    /// Temperature with two decimals and unit.
    pub temperature: String,
}

/// The whole page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    /// Page title.
    pub title: &'static str,
    /// Headline cards, left to right.
    pub stat_cards: Vec<StatCard>,
    /// Chart widgets, left to right.
    pub charts: Vec<ChartData>,
    /// Live panel.
    pub system_status: SystemStatus,
}

impl DashboardView {
    /// Derives the view from the session state.
    #[must_use]
    pub fn from_state(state: &DashboardState) -> Self {
        let gas = state.readings.gas();
        let temperature = state.readings.temperature();

        let stat_cards = vec![
            StatCard {
                title: "Workers",
                value: "1,000".to_string(),
            },
            StatCard {
                title: "Machines",
                value: "1,000".to_string(),
            },
            StatCard {
                title: "Machine Health",
                value: format!("{}% avg. health", health_percent(temperature)),
            },
            StatCard {
                title: "Worker Status",
                value: "20% workforce".to_string(),
            },
        ];

        Self {
            title: DASHBOARD_TITLE,
            stat_cards,
            charts: vec![WORKFORCE_BY_TIME, WORKER_STATUS],
            system_status: SystemStatus {
                connected: state.connected,
                label: if state.connected {
                    "Connected"
                } else {
                    "Disconnected"
                },
                gas_level: format_reading(gas),
                temperature: format!("{}°C", format_reading(temperature)),
            },
        }
    }

    /// Looks up a stat card by title.
    #[must_use]
    pub fn stat_card(&self, title: &str) -> Option<&StatCard> {
        self.stat_cards.iter().find(|card| card.title == title)
    }
}

/// Machine health derived from the temperature: `round(100 - t)`.
///
/// Rounds half toward positive infinity and does not clamp, so the
/// result may be negative or above 100.
#[must_use]
pub fn health_percent(temperature: f64) -> f64 {
    let raw = 100.0 - temperature;
    let floor = raw.floor();
    let rounded = if raw - floor >= 0.5 { floor + 1.0 } else { floor };
    // Avoid printing "-0".
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Formats a reading with exactly two decimals.
///
/// Exact ties round away from zero, so `22.125` reads `22.13`. Only
/// values on an odd multiple of 1/8 sit exactly halfway between two
/// hundredths; everything else is already rounded to nearest by `{:.2}`,
/// which keeps `1.005` (stored just below the tie) at `1.00`.
#[must_use]
pub fn format_reading(value: f64) -> String {
    let eighths = value * 8.0;
    let is_tie = eighths.fract() == 0.0 && eighths.rem_euclid(2.0) == 1.0;
    if is_tie {
        let rounded = (value * 100.0).round() / 100.0;
        format!("{rounded:.2}")
    } else {
        format!("{value:.2}")
    }
}
