//! Headline numbers shown above each report.

use pulse_common::round_to;
use pulse_model::{CellValue, NormalizedTable, SEARCH_CTR_COLUMN};
use serde::Serialize;

use crate::normalization::format_duration;

/// One headline figure with its display string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub label: &'static str,
    pub value: f64,
    pub display: String,
}

impl Headline {
    fn count(label: &'static str, value: f64) -> Self {
        Self {
            label,
            value,
            display: format_thousands(value.trunc() as i64),
        }
    }

    fn percent(label: &'static str, value: f64) -> Self {
        Self {
            label,
            value,
            display: format!("{value:.2}%"),
        }
    }

    fn duration(label: &'static str, value: f64) -> Self {
        Self {
            label,
            value,
            display: format_duration(value),
        }
    }

    fn average(label: &'static str, value: f64) -> Self {
        let value = round_to(value, 2);
        Self {
            label,
            value,
            display: format!("{value:.2}"),
        }
    }
}

/// Integer with `,` thousands separators.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn sum(table: &NormalizedTable, column: &str) -> f64 {
    table.sum(column).unwrap_or_default()
}

fn mean(table: &NormalizedTable, column: &str) -> f64 {
    table.mean(column).unwrap_or_default()
}

/// Totals and averages for the web-traffic table.
pub fn traffic_headlines(table: &NormalizedTable) -> Vec<Headline> {
    vec![
        Headline::count("Total Users", sum(table, "totalUsers")),
        Headline::count("Active Users", sum(table, "activeUsers")),
        Headline::count("New Users", sum(table, "newUsers")),
        Headline::count("Returning Users", sum(table, "returningUsers")),
        Headline::percent("Average Engagement Rate", mean(table, "engagementRate")),
        Headline::percent("Average Bounce Rate", mean(table, "bounceRate")),
        Headline::duration(
            "Average Session Duration",
            mean(table, "averageSessionDuration"),
        ),
        Headline::duration("Avg. Engagement Time/User", mean(table, "avgEngPerUser")),
        Headline::percent("Avg. User Stickiness", mean(table, "userStickiness")),
        Headline::count("Total Page Views", sum(table, "screenPageViews")),
    ]
}

/// Search totals. Impressions and clicks only appear when non-zero; the
/// click-through rate only when the column exists.
pub fn search_headlines(table: &NormalizedTable) -> Vec<Headline> {
    let mut out = vec![Headline::count(
        "Total Organic Searches",
        sum(table, "organicSearches"),
    )];
    let impressions = sum(table, "impressions");
    if impressions > 0.0 {
        out.push(Headline::count("Total Impressions", impressions));
    }
    let clicks = sum(table, "clicks");
    if clicks > 0.0 {
        out.push(Headline::count("Total Clicks", clicks));
    }
    if table.has_column(SEARCH_CTR_COLUMN) {
        out.push(Headline::percent(
            "Average CTR",
            mean(table, SEARCH_CTR_COLUMN),
        ));
    }
    out
}

/// Per-item averages for a video or short table, rounded to 2 decimals.
/// Empty tables have no averages.
pub fn video_averages(table: &NormalizedTable) -> Vec<Headline> {
    if table.is_empty() {
        return Vec::new();
    }
    let reactions: Vec<f64> = (0..table.height())
        .map(|row| {
            ["Likes", "Comments", "Shares"]
                .iter()
                .filter_map(|column| table.value(row, column).and_then(|v| v.as_f64()))
                .sum::<f64>()
                / 3.0
        })
        .collect();
    let avg_reactions = reactions.iter().sum::<f64>() / reactions.len() as f64;
    vec![
        Headline::average("Avg Views", mean(table, "Views")),
        Headline::average("Avg Watch Time (min)", mean(table, "Watch Time (min)")),
        Headline::average("Avg Reach", mean(table, "Reach")),
        Headline::average("Avg Impressions", mean(table, "Impressions")),
        Headline::average("Avg Subscriber Gain", mean(table, "Subscriber Gain")),
        Headline::average("Avg Reactions", avg_reactions),
    ]
}
