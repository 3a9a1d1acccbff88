use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{Days, Local, NaiveDate};
use tracing::{info, info_span, warn};

use pulse_ingest::vendor::{mailchimp, twitter, youtube};
use pulse_ingest::{CsvOptions, expand_inputs, read_report_csv, read_report_response};
use pulse_model::{DEFAULT_CHANNELS, DateRange, NormalizedTable, ReportKind};
use pulse_output::{
    CsvExportOptions, SummarySection, headline_table, stack_labelled, write_sections_file,
    write_table_csv_file,
};
use pulse_transform::normalize::DATE_COLUMN;
use pulse_transform::campaigns::TOP_CAMPAIGN_LIMIT;
use pulse_transform::posts::TOP_POST_LIMIT;
use pulse_transform::videos::TOP_VIDEO_LIMIT;
use pulse_transform::{
    Headline, aggregate_channels, audience_activity, audience_overview, compare_tables,
    comparison_table, daily_engagement, daily_post_counts, fetch_report, filter_by_send_date,
    filter_date_range, filter_growth, growth_history, hourly_engagement, media_comparison,
    merge_campaigns, merge_pagesense, monthly_campaign_stats, normalize_report, posts_table,
    search_headlines, text_length_engagement, top_campaigns_by_open_rate, top_posts, top_videos,
    traffic_headlines, video_averages, video_tables, weekday_engagement,
};

use crate::cli::{
    CampaignArgs, CompareArgs, ConfigCheckArgs, PagesenseArgs, PostArgs, RangeArgs, ReportArgs,
    VideoArgs,
};
use crate::config::{ConfigError, PulseConfig, Source};
use crate::source::FileReportSource;

/// Days covered when no range is given.
pub const DEFAULT_RANGE_DAYS: u64 = 30;

/// Channel column of the channel breakdown report.
const CHANNEL_COLUMN: &str = "sessionDefaultChannelGrouping";

/// One printed table with the headline figures shown above it.
#[derive(Debug, Clone)]
pub struct ReportSection {
    pub title: String,
    pub headlines: Vec<Headline>,
    pub table: NormalizedTable,
}

impl ReportSection {
    fn new(title: impl Into<String>, table: NormalizedTable) -> Self {
        Self {
            title: title.into(),
            headlines: Vec::new(),
            table,
        }
    }

    fn with_headlines(mut self, headlines: Vec<Headline>) -> Self {
        self.headlines = headlines;
        self
    }
}

/// Everything a command produced, ready for printing.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub sections: Vec<ReportSection>,
    pub warnings: Vec<String>,
}

impl CommandOutput {
    fn single(title: impl Into<String>, table: NormalizedTable) -> Self {
        Self {
            sections: vec![ReportSection::new(title, table)],
            ..Self::default()
        }
    }
}

/// Range from explicit flags only; `None` keeps every row.
fn explicit_range(range: RangeArgs) -> Option<DateRange> {
    if range.start.is_none() && range.end.is_none() {
        return None;
    }
    Some(resolve_range(range, Local::now().date_naive()))
}

/// Fills whichever bound is absent: `end` defaults to `today`, `start` to
/// [`DEFAULT_RANGE_DAYS`] before `end`.
pub fn resolve_range(range: RangeArgs, today: NaiveDate) -> DateRange {
    let end = range.end.unwrap_or(today);
    let start = range.start.unwrap_or_else(|| {
        end.checked_sub_days(Days::new(DEFAULT_RANGE_DAYS))
            .unwrap_or(end)
    });
    DateRange::new(start, end)
}

fn write_output(path: Option<&Path>, table: &NormalizedTable, include_hidden: bool) -> Result<()> {
    if let Some(path) = path {
        let options = CsvExportOptions {
            include_hidden,
            ..CsvExportOptions::default()
        };
        write_table_csv_file(path, table, options)?;
    }
    Ok(())
}

/// Fetches one report from saved responses, retrying with the reduced
/// response when the full metric set was refused.
pub fn run_report(kind: ReportKind, args: &ReportArgs) -> Result<CommandOutput> {
    let span = info_span!("report", report = %kind);
    let _guard = span.enter();
    let explicit = explicit_range(args.range);
    let range = explicit.unwrap_or_else(|| resolve_range(args.range, Local::now().date_naive()));
    let source = FileReportSource::new(args.response.clone(), args.reduced.clone());
    let outcome = fetch_report(&source, kind, range);

    let mut output = CommandOutput::default();
    if let Some(warning) = outcome.warning() {
        output.warnings.push(warning);
    }
    let table = match explicit {
        Some(range) => filter_date_range(&outcome.table, DATE_COLUMN, range),
        None => outcome.table,
    };
    let headlines = match kind {
        ReportKind::Traffic => traffic_headlines(&table),
        ReportKind::Search => search_headlines(&table),
        _ => Vec::new(),
    };
    write_output(args.output.as_deref(), &table, false)?;
    info!(rows = table.height(), "report ready");
    output
        .sections
        .push(ReportSection::new(kind.label(), table).with_headlines(headlines));
    Ok(output)
}

/// Compares two saved periods of one report. The channel report is summed
/// per channel first.
pub fn run_compare(args: &CompareArgs) -> Result<CommandOutput> {
    let kind = ReportKind::from(args.report);
    let shape = kind.shape();
    let load = |path: &Path| -> Result<NormalizedTable> {
        let response = read_report_response(path)
            .with_context(|| format!("load {} period", kind.label()))?;
        Ok(normalize_report(&shape, Some(&response)))
    };
    let mut previous = load(&args.previous)?;
    let mut current = load(&args.current)?;

    let metrics: Vec<&str> = if args.metrics.is_empty() {
        shape.metrics.to_vec()
    } else {
        args.metrics.iter().map(String::as_str).collect()
    };
    let key = match (&args.key, kind) {
        (Some(key), _) => key.as_str(),
        (None, ReportKind::Channels) => CHANNEL_COLUMN,
        (None, _) => shape.dimensions.first().copied().unwrap_or(DATE_COLUMN),
    };
    if kind == ReportKind::Channels {
        let channels: Vec<&str> = if args.channels.is_empty() {
            DEFAULT_CHANNELS.to_vec()
        } else {
            args.channels.iter().map(String::as_str).collect()
        };
        previous = aggregate_channels(&previous, key, &channels, &metrics)?;
        current = aggregate_channels(&current, key, &channels, &metrics)?;
    }
    for (label, table) in [("previous", &previous), ("current", &current)] {
        if !table.has_column(key) {
            bail!("{label} period has no column {key}");
        }
    }

    let rows = compare_tables(&previous, &current, key, &metrics)?;
    let table = comparison_table(&rows, &metrics, key);
    write_output(args.output.as_deref(), &table, false)?;
    Ok(CommandOutput::single(
        format!("{} comparison", kind.label()),
        table,
    ))
}

/// Merges page-analytics exports. Files with an unknown layout are skipped
/// and reported.
pub fn run_pagesense(args: &PagesenseArgs) -> Result<CommandOutput> {
    let files = expand_inputs(&args.inputs).context("discover report files")?;
    if files.is_empty() {
        bail!("no CSV files found");
    }
    let options = CsvOptions {
        banner_rows: args.banner_rows,
    };
    let mut inputs = Vec::with_capacity(files.len());
    for path in &files {
        inputs.push(read_report_csv(path, options)?);
    }
    let report = merge_pagesense(&inputs)?;

    let mut output = CommandOutput::default();
    for skipped in &report.skipped {
        output
            .warnings
            .push(format!("{skipped}: unknown report layout, skipped"));
    }
    let table = match &args.filter_source {
        Some(source) => {
            if !report.source_names().any(|name| name == source) {
                warn!(source = %source, "filter names no merged file");
            }
            report.filter_by_source(source)
        }
        None => report.table,
    };
    write_output(args.output.as_deref(), &table, args.include_hidden)?;
    output
        .sections
        .push(ReportSection::new("Merged page reports", table));
    Ok(output)
}

pub fn run_campaigns(args: &CampaignArgs) -> Result<CommandOutput> {
    let campaigns = mailchimp::read_campaigns(&args.campaigns)?;
    let reports = mailchimp::read_campaign_reports(&args.reports)?;
    let range = explicit_range(args.range);

    let mut table = merge_campaigns(&campaigns, &reports);
    if let Some(range) = range {
        table = filter_by_send_date(&table, range);
    }
    write_output(args.output.as_deref(), &table, false)?;
    let best = top_campaigns_by_open_rate(&table, TOP_CAMPAIGN_LIMIT)?;
    let monthly = monthly_campaign_stats(&table)?;
    let mut output = CommandOutput::single("Email campaigns", table);
    output
        .sections
        .push(ReportSection::new("Best campaigns by open rate", best));
    output
        .sections
        .push(ReportSection::new("Monthly performance", monthly));

    if let Some(path) = &args.activity {
        let audience = audience_activity(&mailchimp::read_email_activity(path)?);
        output
            .sections
            .push(ReportSection::new("Audience overview", audience_overview(&audience)));
        output
            .sections
            .push(ReportSection::new("Subscriber activity", audience));
    }

    if let Some(path) = &args.growth {
        let history = mailchimp::read_growth_history(path)?;
        let mut growth = growth_history(&history);
        if let Some(range) = range {
            growth = filter_growth(&growth, range);
        }
        output
            .sections
            .push(ReportSection::new("List growth", growth));
    }
    Ok(output)
}

pub fn run_posts(args: &PostArgs) -> Result<CommandOutput> {
    let posts = twitter::read_timeline(&args.timeline)?;
    let mut table = posts_table(&posts);
    if let Some(range) = explicit_range(args.range) {
        table = filter_date_range(&table, DATE_COLUMN, range);
    }
    let mut sections = Vec::new();
    if args.breakdowns {
        sections.push(ReportSection::new("Media vs. no media", media_comparison(&table)?));
        sections.push(ReportSection::new("Engagement by hour (UTC)", hourly_engagement(&table)?));
        sections.push(ReportSection::new("Engagement by weekday", weekday_engagement(&table)?));
        sections.push(ReportSection::new("Engagement by text length", text_length_engagement(&table)?));
        sections.push(ReportSection::new("Daily post frequency", daily_post_counts(&table)?));
    }
    let top = top_posts(&table, args.top_by.into(), TOP_POST_LIMIT)?;
    let (title, table) = if args.daily {
        ("Daily engagement", daily_engagement(&table)?)
    } else {
        ("Posts", table)
    };
    write_output(args.output.as_deref(), &table, false)?;
    let mut output = CommandOutput::single(title, table);
    output.sections.extend(sections);
    output.sections.push(ReportSection::new("Top posts", top));
    Ok(output)
}

/// Videos and shorts with their averages. `--output` writes one sectioned
/// summary file.
pub fn run_videos(args: &VideoArgs) -> Result<CommandOutput> {
    let items = youtube::read_videos(&args.videos)?;
    let tables = video_tables(&items);
    let video_avg = video_averages(&tables.videos);
    let short_avg = video_averages(&tables.shorts);

    if let Some(path) = &args.output {
        let combined = stack_labelled(
            &[("Video", &tables.videos), ("Short", &tables.shorts)],
            "Content Type",
        );
        let sections = [
            SummarySection::new("Video Averages", headline_table(&video_avg)),
            SummarySection::new("Short Averages", headline_table(&short_avg)),
            SummarySection::new("All Content", combined),
        ];
        write_sections_file(path, &sections, CsvExportOptions::default())?;
    }

    let top_long = top_videos(&tables.videos, TOP_VIDEO_LIMIT)?;
    let top_short = top_videos(&tables.shorts, TOP_VIDEO_LIMIT)?;
    Ok(CommandOutput {
        sections: vec![
            ReportSection::new("Videos", tables.videos).with_headlines(video_avg),
            ReportSection::new("Shorts", tables.shorts).with_headlines(short_avg),
            ReportSection::new("Top videos by views", top_long),
            ReportSection::new("Top shorts by views", top_short),
        ],
        warnings: Vec::new(),
    })
}

/// Credential status per source: the config file overlaid with the process
/// environment. The reporting commands work on saved vendor responses and
/// never consult credentials.
pub fn run_config_check(
    config_path: Option<&Path>,
    args: &ConfigCheckArgs,
) -> Result<Vec<(Source, Result<(), ConfigError>)>> {
    let config = PulseConfig::load(config_path)?.with_process_env();
    let sources: Vec<Source> = match args.source {
        Some(source) => vec![source],
        None => Source::ALL.to_vec(),
    };
    Ok(sources
        .into_iter()
        .map(|source| (source, config.require(source)))
        .collect())
}
