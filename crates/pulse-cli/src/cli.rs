//! CLI argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use pulse_model::ReportKind;
use pulse_transform::PostRanking;

use crate::config::Source;

#[derive(Parser)]
#[command(
    name = "pulse",
    version,
    about = "Normalize marketing analytics reports",
    long_about = "Normalize saved analytics, email, social and video reports into consistent \
                  tables.\n\n\
                  Fills metrics the vendor withheld with labelled estimates, compares periods \
                  and merges exported page reports."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Configuration file (default: ./pulse.toml when present).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// How tables are printed.
    #[arg(long = "render", value_enum, default_value = "table", global = true)]
    pub render: RenderArg,
}

#[derive(Subcommand)]
pub enum Command {
    /// Daily web traffic with fallback metrics.
    Traffic(ReportArgs),

    /// Daily organic search performance.
    Search(ReportArgs),

    /// Top pages by views.
    Pages(ReportArgs),

    /// Top search keywords by sessions.
    Keywords(ReportArgs),

    /// Top landing pages by sessions.
    LandingPages(ReportArgs),

    /// Sessions and users by channel, device and country.
    Channels(ReportArgs),

    /// Compare two saved periods of a report.
    Compare(CompareArgs),

    /// Merge exported page-analytics CSV reports.
    Pagesense(PagesenseArgs),

    /// Email campaigns merged with their reports.
    Campaigns(CampaignArgs),

    /// Social post engagement.
    Posts(PostArgs),

    /// Channel videos and shorts.
    Videos(VideoArgs),

    /// Check that credentials are configured.
    ConfigCheck(ConfigCheckArgs),
}

/// Date range flags shared by the reporting commands.
#[derive(Args, Clone, Copy)]
pub struct RangeArgs {
    /// First day of the range (YYYY-MM-DD, default: 30 days before --end).
    #[arg(long = "start", value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD, default: today).
    #[arg(long = "end", value_name = "DATE")]
    pub end: Option<NaiveDate>,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Saved response for the full metric set.
    #[arg(value_name = "RESPONSE")]
    pub response: PathBuf,

    /// Saved response for the reduced metric set, used when the full set
    /// was refused.
    #[arg(long = "reduced", value_name = "RESPONSE")]
    pub reduced: Option<PathBuf>,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Write the normalized table as CSV.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompareArgs {
    /// Report both responses belong to.
    #[arg(long = "report", value_enum, default_value = "landing-pages")]
    pub report: ReportKindArg,

    /// Saved response for the previous period.
    #[arg(value_name = "PREVIOUS")]
    pub previous: PathBuf,

    /// Saved response for the current period.
    #[arg(value_name = "CURRENT")]
    pub current: PathBuf,

    /// Key column (default: the report's first dimension).
    #[arg(long = "key", value_name = "COLUMN")]
    pub key: Option<String>,

    /// Metric to compare (repeatable; default: the report's metrics).
    #[arg(long = "metric", value_name = "COLUMN")]
    pub metrics: Vec<String>,

    /// Channels to keep when comparing the channel report.
    #[arg(long = "channel", value_name = "NAME")]
    pub channels: Vec<String>,

    /// Write the comparison table as CSV.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct PagesenseArgs {
    /// CSV exports or folders containing them.
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Keep only pages contributed by this source file.
    #[arg(long = "filter-source", value_name = "NAME")]
    pub filter_source: Option<String>,

    /// Banner rows above the header in each export.
    #[arg(long = "banner-rows", default_value_t = 1)]
    pub banner_rows: usize,

    /// Write the merged table as CSV.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Include provenance columns in the CSV.
    #[arg(long = "include-hidden")]
    pub include_hidden: bool,
}

#[derive(Args)]
pub struct CampaignArgs {
    /// Saved campaign list.
    #[arg(value_name = "CAMPAIGNS")]
    pub campaigns: PathBuf,

    /// Saved campaign reports.
    #[arg(value_name = "REPORTS")]
    pub reports: PathBuf,

    /// Saved list growth history.
    #[arg(long = "growth", value_name = "PATH")]
    pub growth: Option<PathBuf>,

    /// Saved subscriber activity of one campaign.
    #[arg(long = "activity", value_name = "PATH")]
    pub activity: Option<PathBuf>,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Write the campaign table as CSV.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct PostArgs {
    /// Saved user timeline.
    #[arg(value_name = "TIMELINE")]
    pub timeline: PathBuf,

    /// Print per-day totals instead of individual posts.
    #[arg(long = "daily")]
    pub daily: bool,

    /// Add media, timing, length and frequency breakdowns.
    #[arg(long = "breakdowns")]
    pub breakdowns: bool,

    /// Metric the top posts are ranked by.
    #[arg(long = "top-by", value_enum, default_value_t = RankingArg::TotalEngagement)]
    pub top_by: RankingArg,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Write the table as CSV.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct VideoArgs {
    /// Saved video list.
    #[arg(value_name = "VIDEOS")]
    pub videos: PathBuf,

    /// Write averages and both tables to one CSV.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConfigCheckArgs {
    /// Only check this source.
    #[arg(long = "source", value_enum)]
    pub source: Option<Source>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReportKindArg {
    Traffic,
    Search,
    Pages,
    Keywords,
    LandingPages,
    Channels,
}

impl From<ReportKindArg> for ReportKind {
    fn from(arg: ReportKindArg) -> Self {
        match arg {
            ReportKindArg::Traffic => ReportKind::Traffic,
            ReportKindArg::Search => ReportKind::Search,
            ReportKindArg::Pages => ReportKind::TopPages,
            ReportKindArg::Keywords => ReportKind::Keywords,
            ReportKindArg::LandingPages => ReportKind::LandingPages,
            ReportKindArg::Channels => ReportKind::Channels,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RankingArg {
    Likes,
    Retweets,
    Replies,
    TotalEngagement,
    EngagementScore,
}

impl From<RankingArg> for PostRanking {
    fn from(arg: RankingArg) -> Self {
        match arg {
            RankingArg::Likes => PostRanking::Likes,
            RankingArg::Retweets => PostRanking::Retweets,
            RankingArg::Replies => PostRanking::Replies,
            RankingArg::TotalEngagement => PostRanking::TotalEngagement,
            RankingArg::EngagementScore => PostRanking::EngagementScore,
        }
    }
}

/// How tables are printed.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderArg {
    /// Bordered terminal table.
    Table,
    /// Polars DataFrame display.
    Frame,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
