//! Email campaign tables: campaign/report merge, list growth history and the
//! rankings and audience views derived from them.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use pulse_common::round_to;
use pulse_ingest::vendor::mailchimp::{Campaign, CampaignReport, EmailActivity, GrowthMonth};
use pulse_model::{CellValue, DateRange, NormalizedTable, Result, TableBuilder};
use tracing::debug;

use crate::normalization::{format_day_month_year, parse_month, parse_vendor_timestamp};
use crate::normalize::filter_date_range;

pub const CAMPAIGN_ID: &str = "Campaign ID";
pub const SEND_DATE: &str = "Send Date";
/// Sortable send date behind the day-first display column.
pub const SEND_DATE_VALUE: &str = "_send_date";

pub const CAMPAIGN_COLUMNS: &[&str] = &[
    CAMPAIGN_ID,
    "Campaign Name",
    "Subject Line",
    SEND_DATE,
    "Emails Sent",
    "Open Rate",
    "Click Rate",
    "Unsubscribe Rate",
    "Bounce Rate",
    "Status",
    SEND_DATE_VALUE,
];

/// Columns of the best-campaigns listing.
pub const TOP_CAMPAIGN_COLUMNS: &[&str] = &[
    "Campaign Name",
    SEND_DATE,
    "Open Rate",
    "Click Rate",
    "Emails Sent",
];

pub const TOP_CAMPAIGN_LIMIT: usize = 5;

pub const MONTHLY_CAMPAIGN_COLUMNS: &[&str] = &[
    "Month",
    "Open Rate",
    "Click Rate",
    "Emails Sent",
    "Campaign Count",
];

pub const AUDIENCE_COLUMNS: &[&str] = &["Email Address", "Open Count", "Click Count", "Last Opened"];

/// Engagement categories of [`audience_overview`], in display order.
pub const AUDIENCE_CATEGORIES: [&str; 3] = ["Never Opened", "Opened Only", "Clicked"];

pub const GROWTH_COLUMNS: &[&str] = &[
    "Month",
    "Subscriber Count",
    "New Subscribers",
    "Unsubscribes",
    "Net Growth",
];

/// Vendor rate fraction to a 2-decimal percentage.
fn percent(rate: f64) -> CellValue {
    CellValue::number(round_to(rate * 100.0, 2))
}

fn send_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(parse_vendor_timestamp).map(|ts| ts.date())
}

/// Outer-joins campaigns and their reports on `Campaign ID`.
///
/// For fields both sides carry, the campaign value wins and the report only
/// fills rows without a campaign; `Emails Sent` then falls back to the
/// report's recipient count. Report-only rates are missing on campaign-only
/// rows. Rows are ordered by campaign id.
pub fn merge_campaigns(campaigns: &[Campaign], reports: &[CampaignReport]) -> NormalizedTable {
    let mut by_id: BTreeMap<String, (Option<&Campaign>, Option<&CampaignReport>)> =
        BTreeMap::new();
    for campaign in campaigns {
        by_id.entry(campaign.id.clone()).or_default().0 = Some(campaign);
    }
    for report in reports {
        let id = report.id.clone().unwrap_or_else(|| "Unknown".to_string());
        by_id.entry(id).or_default().1 = Some(report);
    }

    let mut table = TableBuilder::new(CAMPAIGN_COLUMNS.iter().copied());
    for (id, (campaign, report)) in &by_id {
        let date = campaign
            .and_then(|c| send_date(c.send_time.as_deref()))
            .or_else(|| report.and_then(|r| send_date(r.send_time.as_deref())));
        table.push_row_with(|column| match column {
            CAMPAIGN_ID => CellValue::text(id.clone()),
            "Campaign Name" => match (campaign, report) {
                (Some(c), _) => CellValue::text(c.settings.title.as_deref().unwrap_or("Untitled")),
                (None, Some(r)) => CellValue::text(r.campaign_title.as_deref().unwrap_or("Untitled")),
                (None, None) => CellValue::Missing,
            },
            "Subject Line" => campaign.map_or(CellValue::Missing, |c| {
                CellValue::text(c.settings.subject_line.as_deref().unwrap_or("No Subject"))
            }),
            SEND_DATE => date.map_or(CellValue::Missing, |d| CellValue::text(format_day_month_year(d))),
            SEND_DATE_VALUE => date.map_or(CellValue::Missing, CellValue::Date),
            "Emails Sent" => match (campaign, report) {
                (Some(c), _) => CellValue::Count(c.emails_sent.unwrap_or(0)),
                (None, Some(r)) => CellValue::Count(r.emails_sent.unwrap_or(0)),
                (None, None) => CellValue::Missing,
            },
            "Open Rate" => match (campaign, report) {
                (Some(c), _) => percent(c.report_summary.as_ref().and_then(|s| s.open_rate).unwrap_or(0.0)),
                (None, Some(r)) => percent(r.opens.as_ref().and_then(|o| o.open_rate).unwrap_or(0.0)),
                (None, None) => CellValue::Missing,
            },
            "Click Rate" => match (campaign, report) {
                (Some(c), _) => percent(c.report_summary.as_ref().and_then(|s| s.click_rate).unwrap_or(0.0)),
                (None, Some(r)) => percent(r.clicks.as_ref().and_then(|o| o.click_rate).unwrap_or(0.0)),
                (None, None) => CellValue::Missing,
            },
            "Unsubscribe Rate" => report.map_or(CellValue::Missing, |r| {
                percent(r.unsubscribes.as_ref().and_then(|u| u.unsubscribe_rate).unwrap_or(0.0))
            }),
            "Bounce Rate" => report.map_or(CellValue::Missing, |r| {
                percent(r.bounces.as_ref().and_then(|b| b.bounce_rate).unwrap_or(0.0))
            }),
            "Status" => campaign.map_or(CellValue::Missing, |c| {
                CellValue::text(c.status.as_deref().unwrap_or("Unknown"))
            }),
            _ => CellValue::Missing,
        });
    }
    let table = table.finish();
    debug!(
        campaigns = campaigns.len(),
        reports = reports.len(),
        rows = table.height(),
        "merged campaign data"
    );
    table
}

/// Keeps campaigns sent within the range (inclusive). Campaigns without a
/// send date are dropped.
pub fn filter_by_send_date(table: &NormalizedTable, range: DateRange) -> NormalizedTable {
    filter_date_range(table, SEND_DATE_VALUE, range)
}

/// The `limit` campaigns with the highest open rate, best first.
pub fn top_campaigns_by_open_rate(table: &NormalizedTable, limit: usize) -> Result<NormalizedTable> {
    let mut ranked = table.clone();
    ranked.sort_by_column("Open Rate", true);
    ranked.truncate(limit);
    ranked.select(TOP_CAMPAIGN_COLUMNS)
}

/// Per send month: mean open and click rates, emails sent and the number of
/// campaigns. Months run oldest first and display as `MM-YYYY`; campaigns
/// without a send date are left out.
pub fn monthly_campaign_stats(table: &NormalizedTable) -> Result<NormalizedTable> {
    let Some(dates) = table.column(SEND_DATE_VALUE) else {
        return Ok(NormalizedTable::new(MONTHLY_CAMPAIGN_COLUMNS.iter().copied()));
    };
    if table.is_empty() {
        return Ok(NormalizedTable::new(MONTHLY_CAMPAIGN_COLUMNS.iter().copied()));
    }
    let months = dates
        .iter()
        .map(|cell| {
            cell.as_date()
                .and_then(|d| d.with_day(1))
                .map_or(CellValue::Missing, CellValue::Date)
        })
        .collect();
    let mut keyed = table.select(&["Open Rate", "Click Rate", "Emails Sent"])?;
    keyed.add_column("Month", months)?;

    let data = keyed
        .lazy()
        .filter(col("Month").is_not_null())
        .group_by([col("Month")])
        .agg([
            col("Open Rate").cast(DataType::Float64).mean(),
            col("Click Rate").cast(DataType::Float64).mean(),
            col("Emails Sent")
                .cast(DataType::UInt64)
                .fill_null(lit(0u64))
                .sum(),
            len().alias("Campaign Count"),
        ])
        .sort(["Month"], SortMultipleOptions::default())
        .collect()?;
    let mut stats = NormalizedTable::from_frame(data);
    stats.map_column("Month", |cell| {
        cell.as_date()
            .map_or(CellValue::Missing, |d| CellValue::text(d.format("%m-%Y").to_string()))
    });
    Ok(stats)
}

/// One row per subscriber of a campaign. Missing addresses and open times
/// read `N/A`.
pub fn audience_activity(activity: &[EmailActivity]) -> NormalizedTable {
    let mut table = TableBuilder::new(AUDIENCE_COLUMNS.iter().copied());
    for subscriber in activity {
        let last_open = subscriber
            .last_open
            .as_deref()
            .and_then(parse_vendor_timestamp)
            .map_or_else(|| "N/A".to_string(), |ts| ts.format("%d-%m-%Y %H:%M").to_string());
        table.push_row_with(|column| match column {
            "Email Address" => CellValue::text(subscriber.email_address.as_deref().unwrap_or("N/A")),
            "Open Count" => CellValue::Count(subscriber.opens()),
            "Click Count" => CellValue::Count(subscriber.clicks()),
            "Last Opened" => CellValue::text(last_open.clone()),
            _ => CellValue::Missing,
        });
    }
    table.finish()
}

/// Subscribers per engagement category: never opened, opened without
/// clicking, clicked.
pub fn audience_overview(audience: &NormalizedTable) -> NormalizedTable {
    let mut counts = [0u64; 3];
    let opens = audience.numeric_column("Open Count").unwrap_or_default();
    let clicks = audience.numeric_column("Click Count").unwrap_or_default();
    for idx in 0..audience.height() {
        let opened = opens.get(idx).copied().flatten().unwrap_or(0.0) > 0.0;
        let clicked = clicks.get(idx).copied().flatten().unwrap_or(0.0) > 0.0;
        let slot = match (opened, clicked) {
            (_, true) => 2,
            (true, false) => 1,
            (false, false) => 0,
        };
        counts[slot] = counts[slot].saturating_add(1);
    }
    let mut table = TableBuilder::new(["Category", "Count"]);
    for (category, count) in AUDIENCE_CATEGORIES.iter().zip(counts) {
        table.push_row_with(|column| match column {
            "Category" => CellValue::text(*category),
            _ => CellValue::Count(count),
        });
    }
    table.finish()
}

/// Monthly list growth, sorted by month. New subscribers are imports plus
/// opt-ins; net growth subtracts unsubscribes.
pub fn growth_history(history: &[GrowthMonth]) -> NormalizedTable {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    let mut months: Vec<(NaiveDate, &GrowthMonth)> = history
        .iter()
        .map(|h| (h.month.as_deref().and_then(parse_month).unwrap_or(epoch), h))
        .collect();
    months.sort_by_key(|(month, _)| *month);

    let mut table = TableBuilder::new(GROWTH_COLUMNS.iter().copied());
    for (month, h) in months {
        let added = h.imports.saturating_add(h.optins);
        table.push_row_with(|column| match column {
            "Month" => CellValue::Date(month),
            "Subscriber Count" => CellValue::Count(h.existing),
            "New Subscribers" => CellValue::Count(added),
            "Unsubscribes" => CellValue::Count(h.unsubscribes),
            "Net Growth" => CellValue::Number(added as f64 - h.unsubscribes as f64),
            _ => CellValue::Missing,
        });
    }
    table.finish()
}

/// Keeps months overlapping the range: from the first of the start month to
/// the end of the end month.
pub fn filter_growth(table: &NormalizedTable, range: DateRange) -> NormalizedTable {
    let start = range.start.with_day(1).unwrap_or(range.start);
    let end = range.end.with_day(1).unwrap_or(range.end);
    let mut out = table.clone();
    if let Some(idx) = out.column_index("Month") {
        out.retain_rows(|row| {
            row.get(idx)
                .and_then(CellValue::as_date)
                .is_some_and(|m| m >= start && m <= end)
        });
    }
    out
}
