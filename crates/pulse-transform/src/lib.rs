//! Report normalization.
//!
//! Turns vendor responses and exported files into [`NormalizedTable`]s:
//!
//! - **normalize / report**: typed tables per report shape
//! - **traffic, search, ranked**: per-shape completion rules
//! - **attempt**: primary-then-reduced fetch policy over a [`ReportSource`]
//! - **compare**: period-over-period merges and channel totals
//! - **pagesense**: exported CSV ingestion and group-merge
//! - **campaigns, posts, videos**: email, social and video tables
//! - **summary**: headline figures
//! - **frame**: Polars building blocks for the derived tables
//!
//! [`NormalizedTable`]: pulse_model::NormalizedTable

pub mod attempt;
pub mod campaigns;
pub mod compare;
pub mod frame;
pub mod normalization;
pub mod normalize;
pub mod pagesense;
pub mod posts;
pub mod ranked;
pub mod report;
pub mod search;
pub mod summary;
pub mod traffic;
pub mod videos;

pub use attempt::{ReportSource, fetch_report};
pub use campaigns::{
    audience_activity, audience_overview, filter_by_send_date, filter_growth, growth_history,
    merge_campaigns, monthly_campaign_stats, top_campaigns_by_open_rate,
};
pub use compare::{aggregate_channels, compare_tables, comparison_table, percent_change};
pub use frame::{aligned_frame, group_means, key_totals};
pub use normalize::{empty_table, filter_date_range, normalize_records, normalize_response};
pub use pagesense::{PagesenseLayout, PagesenseReport, merge_pagesense, parse_pagesense};
pub use posts::{
    PostRanking, daily_engagement, daily_post_counts, hourly_engagement, media_comparison,
    posts_table, text_length_engagement, top_posts, weekday_engagement,
};
pub use ranked::{apply_ranked_rules, apply_search_term_placeholder, top_n};
pub use report::normalize_report;
pub use search::apply_search_rules;
pub use summary::{Headline, search_headlines, traffic_headlines, video_averages};
pub use traffic::{apply_traffic_fallbacks, rolling_mean};
pub use videos::{VideoTables, top_videos, video_tables};
