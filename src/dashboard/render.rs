//! Plain-text rendering of a [`DashboardView`] for the terminal.

use std::fmt::Write as _;

use super::view::{ChartData, ChartKind, DashboardView};

/// Renders the whole page as text.
#[must_use]
pub fn render_view(view: &DashboardView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.title);
    let _ = writeln!(out, "{}", "=".repeat(view.title.chars().count()));

    let cards: Vec<String> = view
        .stat_cards
        .iter()
        .map(|card| format!("{}: {}", card.title, card.value))
        .collect();
    let _ = writeln!(out, "{}", cards.join(" | "));

    for chart in &view.charts {
        out.push('\n');
        render_chart(&mut out, chart);
    }

    let status = &view.system_status;
    let _ = writeln!(out, "\nSystem Status");
    let _ = writeln!(out, "  {}", status.label);
    let _ = writeln!(out, "  Gas Level: {}", status.gas_level);
    let _ = writeln!(out, "  Temperature: {}", status.temperature);
    out
}

fn render_chart(out: &mut String, chart: &ChartData) {
    match chart.y_axis_title {
        Some(axis) => {
            let _ = writeln!(out, "{} ({axis})", chart.title);
        }
        None => {
            let _ = writeln!(out, "{}", chart.title);
        }
    }

    let width = chart.labels.iter().map(|l| l.len()).max().unwrap_or(0);
    let total = chart.total();
    for (label, value) in chart.points() {
        match chart.kind {
            ChartKind::Bar => {
                let bar = "#".repeat(usize::try_from(value).unwrap_or(0));
                let _ = writeln!(out, "  {label:<width$}  {bar} {value}");
            }
            ChartKind::Pie => {
                let share = if total == 0 {
                    0.0
                } else {
                    f64::from(value) * 100.0 / f64::from(total)
                };
                let _ = writeln!(out, "  {label:<width$}  {value} ({share:.1}%)");
            }
        }
    }
}
