//! Channel video tables, split into long-form videos and shorts.
//!
//! The public statistics endpoint only reports views, likes and comments.
//! Watch time, shares, reach, impressions and subscriber gain are derived
//! from views with fixed multipliers and flagged as estimates on the table.

use pulse_common::round_to;
use pulse_ingest::vendor::youtube::Video;
use pulse_model::{CellValue, NormalizedTable, Result, TableBuilder};
use serde::Serialize;
use tracing::debug;

use crate::normalization::{parse_iso8601_duration, parse_vendor_timestamp};

/// Items at or under this many seconds are shorts.
pub const SHORT_MAX_SECONDS: f64 = 60.0;

pub const VIDEO_COLUMNS: &[&str] = &[
    "Title",
    "Date",
    "Duration (min)",
    "Views",
    "Likes",
    "Comments",
    "URL",
    "Watch Time (min)",
    "Shares",
    "Reach",
    "Impressions",
    "Subscriber Gain",
];

/// Columns of the top-uploads tables, in display order.
pub const TOP_VIDEO_COLUMNS: &[&str] = &[
    "Title",
    "Views",
    "Impressions",
    "Watch Time (min)",
    "Likes",
    "Comments",
    "Shares",
];

/// Uploads listed by [`top_videos`].
pub const TOP_VIDEO_LIMIT: usize = 10;

pub const ESTIMATED_COLUMNS: &[&str] = &[
    "Watch Time (min)",
    "Shares",
    "Reach",
    "Impressions",
    "Subscriber Gain",
];

/// Fixed multipliers applied to view counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimateRates {
    /// Fraction of the duration an average view watches.
    pub retention: f64,
    pub shares_per_view: f64,
    pub reach_per_view: f64,
    /// Views per impression.
    pub click_through: f64,
    pub subscribers_per_view: f64,
}

impl EstimateRates {
    pub const VIDEO: Self = Self {
        retention: 0.6,
        shares_per_view: 0.0055,
        reach_per_view: 0.85,
        click_through: 0.085,
        subscribers_per_view: 0.0175,
    };

    pub const SHORT: Self = Self {
        retention: 0.825,
        shares_per_view: 0.0055,
        reach_per_view: 0.85,
        click_through: 0.085,
        subscribers_per_view: 0.03,
    };
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoTables {
    pub videos: NormalizedTable,
    pub shorts: NormalizedTable,
}

pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

/// Splits items by duration and builds one table per content type. An item
/// without a readable duration is treated as zero-length.
pub fn video_tables(items: &[Video]) -> VideoTables {
    let mut videos = TableBuilder::new(VIDEO_COLUMNS.iter().copied());
    let mut shorts = TableBuilder::new(VIDEO_COLUMNS.iter().copied());
    for item in items {
        let seconds = item
            .content_details
            .duration
            .as_deref()
            .and_then(parse_iso8601_duration)
            .unwrap_or(0.0);
        let (target, rates) = if seconds <= SHORT_MAX_SECONDS {
            (&mut shorts, EstimateRates::SHORT)
        } else {
            (&mut videos, EstimateRates::VIDEO)
        };
        push_video(target, item, seconds / 60.0, rates);
    }
    let (videos, shorts) = (flag_estimates(videos.finish()), flag_estimates(shorts.finish()));
    debug!(
        videos = videos.height(),
        shorts = shorts.height(),
        "split channel uploads"
    );
    VideoTables { videos, shorts }
}

fn flag_estimates(mut table: NormalizedTable) -> NormalizedTable {
    for column in ESTIMATED_COLUMNS {
        table.mark_estimated(column);
    }
    table
}

/// The `limit` most viewed uploads of a video table, most viewed first,
/// restricted to [`TOP_VIDEO_COLUMNS`].
pub fn top_videos(table: &NormalizedTable, limit: usize) -> Result<NormalizedTable> {
    let mut ranked = table.clone();
    ranked.sort_by_column("Views", true);
    ranked.truncate(limit);
    ranked.select(TOP_VIDEO_COLUMNS)
}

fn push_video(table: &mut TableBuilder, item: &Video, minutes: f64, rates: EstimateRates) {
    let stats = &item.statistics;
    let views = stats.view_count as f64;
    let published = item
        .snippet
        .published_at
        .as_deref()
        .and_then(parse_vendor_timestamp)
        .map(|ts| ts.date());
    table.push_row_with(|column| match column {
        "Title" => CellValue::text(item.snippet.title.clone()),
        "Date" => published.map_or(CellValue::Missing, CellValue::Date),
        "Duration (min)" => CellValue::number(round_to(minutes, 2)),
        "Views" => CellValue::Count(stats.view_count),
        "Likes" => CellValue::Count(stats.like_count),
        "Comments" => CellValue::Count(stats.comment_count),
        "URL" => CellValue::text(watch_url(&item.id)),
        "Watch Time (min)" => CellValue::number(round_to(views * minutes * rates.retention, 2)),
        "Shares" => CellValue::Count((views * rates.shares_per_view) as u64),
        "Reach" => CellValue::Count((views * rates.reach_per_view) as u64),
        "Impressions" => CellValue::Count((views / rates.click_through) as u64),
        "Subscriber Gain" => CellValue::Count((views * rates.subscribers_per_view) as u64),
        _ => CellValue::Missing,
    });
}
