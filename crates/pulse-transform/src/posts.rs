//! Social post engagement table.

use chrono::{Datelike, Timelike};
use polars::prelude::*;
use pulse_ingest::vendor::twitter::Post;
use pulse_model::{CellValue, NormalizedTable, Result, TableBuilder};

use crate::frame::group_means;

pub const POST_COLUMNS: &[&str] = &[
    "id",
    "text",
    "created_at",
    "likes",
    "retweets",
    "replies",
    "quotes",
    "impressions",
    "total_engagement",
    "engagement_rate",
    "engagement_score",
    "hour_of_day",
    "day_of_week",
    "is_weekend",
    "text_length",
    "has_media",
    "date",
];

/// Columns summed per day by [`daily_engagement`].
pub const DAILY_COLUMNS: &[&str] = &["likes", "retweets", "replies", "quotes", "total_engagement"];

/// Means compared between posts with and without media.
pub const MEDIA_METRICS: &[&str] = &["likes", "retweets", "replies", "quotes", "total_engagement"];

/// Means reported per hour, weekday and text length.
pub const TIMING_METRICS: &[&str] = &["likes", "retweets", "total_engagement"];

/// Number of posts in each group of the grouped engagement tables.
pub const POST_COUNT_COLUMN: &str = "tweet_count";

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Upper bound (inclusive) and label of each text length bin.
pub const TEXT_LENGTH_BINS: [(u64, &str); 6] = [
    (50, "0-50"),
    (100, "51-100"),
    (150, "101-150"),
    (200, "151-200"),
    (250, "201-250"),
    (280, "251-280"),
];

/// Columns shown for the top posts.
pub const TOP_POST_COLUMNS: &[&str] = &[
    "created_at",
    "text",
    "likes",
    "retweets",
    "replies",
    "total_engagement",
    "engagement_score",
];

pub const TOP_POST_LIMIT: usize = 10;

const BUCKET: &str = "_bucket";

/// Likes count once, retweets twice, replies and quotes one and a half times.
pub fn engagement_score(likes: u64, retweets: u64, replies: u64, quotes: u64) -> f64 {
    likes as f64 + 2.0 * retweets as f64 + 1.5 * (replies + quotes) as f64
}

/// Engagement as a percentage of impressions, zero without impressions.
pub fn engagement_rate(total: u64, impressions: u64) -> f64 {
    if impressions > 0 {
        total as f64 / impressions as f64 * 100.0
    } else {
        0.0
    }
}

/// One row per post with derived engagement and timing columns. Times are UTC
/// and `day_of_week` counts from Monday = 0.
pub fn posts_table(posts: &[Post]) -> NormalizedTable {
    let mut table = TableBuilder::new(POST_COLUMNS.iter().copied());
    for post in posts {
        let m = post.public_metrics;
        let total = m
            .like_count
            .saturating_add(m.retweet_count)
            .saturating_add(m.reply_count)
            .saturating_add(m.quote_count);
        let weekday = post.created_at.weekday().num_days_from_monday();
        table.push_row_with(|column| match column {
            "id" => CellValue::text(post.id.clone()),
            "text" => CellValue::text(post.text.clone()),
            "created_at" => {
                CellValue::text(post.created_at.format("%Y-%m-%d %H:%M:%S").to_string())
            }
            "likes" => CellValue::Count(m.like_count),
            "retweets" => CellValue::Count(m.retweet_count),
            "replies" => CellValue::Count(m.reply_count),
            "quotes" => CellValue::Count(m.quote_count),
            "impressions" => CellValue::Count(m.impression_count),
            "total_engagement" => CellValue::Count(total),
            "engagement_rate" => CellValue::number(engagement_rate(total, m.impression_count)),
            "engagement_score" => CellValue::number(engagement_score(
                m.like_count,
                m.retweet_count,
                m.reply_count,
                m.quote_count,
            )),
            "hour_of_day" => CellValue::Count(u64::from(post.created_at.hour())),
            "day_of_week" => CellValue::Count(u64::from(weekday)),
            "is_weekend" => CellValue::text(if weekday >= 5 { "true" } else { "false" }),
            "text_length" => CellValue::Count(post.text.chars().count() as u64),
            "has_media" => CellValue::text(if post.has_media() { "true" } else { "false" }),
            "date" => CellValue::Date(post.created_at.date_naive()),
            _ => CellValue::Missing,
        });
    }
    table.finish()
}

/// Per-day sums of the engagement counts, ascending by date.
pub fn daily_engagement(posts: &NormalizedTable) -> Result<NormalizedTable> {
    let columns = || std::iter::once("date").chain(DAILY_COLUMNS.iter().copied());
    if posts.is_empty() || !posts.has_column("date") {
        return Ok(NormalizedTable::new(columns()));
    }
    let sums: Vec<Expr> = DAILY_COLUMNS
        .iter()
        .map(|name| count_of(posts, name).sum().alias(*name))
        .collect();
    let data = posts
        .lazy()
        .filter(col("date").is_not_null())
        .group_by([col("date")])
        .agg(sums)
        .sort(["date"], SortMultipleOptions::default())
        .collect()?;
    Ok(NormalizedTable::from_frame(data))
}

/// Number of posts per day, ascending by date.
pub fn daily_post_counts(posts: &NormalizedTable) -> Result<NormalizedTable> {
    if posts.is_empty() || !posts.has_column("date") {
        return Ok(NormalizedTable::new(["date", "count"]));
    }
    let data = posts
        .lazy()
        .filter(col("date").is_not_null())
        .group_by([col("date")])
        .agg([len().alias("count")])
        .sort(["date"], SortMultipleOptions::default())
        .collect()?;
    Ok(NormalizedTable::from_frame(data))
}

/// A count column as `UInt64` with missing values as zero; absent columns
/// read as all zero.
fn count_of(posts: &NormalizedTable, name: &str) -> Expr {
    if posts.has_column(name) {
        col(name).cast(DataType::UInt64).fill_null(lit(0u64))
    } else {
        lit(0u64)
    }
}

/// Mean engagement of posts with media against posts without, "No Media"
/// first.
pub fn media_comparison(posts: &NormalizedTable) -> Result<NormalizedTable> {
    let bucket = when(col("has_media").eq(lit("true")))
        .then(lit(1u32))
        .otherwise(lit(0u32));
    ordered_groups(
        posts,
        "has_media",
        bucket,
        MEDIA_METRICS,
        "media_type",
        Some(&["No Media", "With Media"][..]),
    )
}

/// Mean engagement per UTC hour, hours without posts left out.
pub fn hourly_engagement(posts: &NormalizedTable) -> Result<NormalizedTable> {
    ordered_groups(
        posts,
        "hour_of_day",
        col("hour_of_day"),
        TIMING_METRICS,
        "hour_of_day",
        None,
    )
}

/// Mean engagement per weekday, Monday first.
pub fn weekday_engagement(posts: &NormalizedTable) -> Result<NormalizedTable> {
    ordered_groups(
        posts,
        "day_of_week",
        col("day_of_week"),
        TIMING_METRICS,
        "day_name",
        Some(WEEKDAY_NAMES.as_slice()),
    )
}

/// Mean engagement per text length bin. An empty post falls in the first
/// bin; posts longer than the last bound are left out.
pub fn text_length_engagement(posts: &NormalizedTable) -> Result<NormalizedTable> {
    let length = || col("text_length");
    let [b0, b1, b2, b3, b4, b5] = TEXT_LENGTH_BINS.map(|(bound, _)| lit(bound));
    let bucket = when(length().lt_eq(b0))
        .then(lit(0u32))
        .when(length().lt_eq(b1))
        .then(lit(1u32))
        .when(length().lt_eq(b2))
        .then(lit(2u32))
        .when(length().lt_eq(b3))
        .then(lit(3u32))
        .when(length().lt_eq(b4))
        .then(lit(4u32))
        .when(length().lt_eq(b5))
        .then(lit(5u32))
        .otherwise(lit(Null {}).cast(DataType::UInt32));
    let labels = TEXT_LENGTH_BINS.map(|(_, label)| label);
    ordered_groups(
        posts,
        "text_length",
        bucket,
        TIMING_METRICS,
        "text_length_bin",
        Some(labels.as_slice()),
    )
}

/// Groups posts by a bucket index, averages `metrics`, counts posts and
/// sorts by the index. With `labels` the index is replaced by its label.
fn ordered_groups(
    posts: &NormalizedTable,
    source: &str,
    bucket: Expr,
    metrics: &[&str],
    label_column: &str,
    labels: Option<&[&str]>,
) -> Result<NormalizedTable> {
    let columns = std::iter::once(label_column)
        .chain(metrics.iter().copied())
        .chain(std::iter::once(POST_COUNT_COLUMN));
    if posts.is_empty() || !posts.has_column(source) {
        return Ok(NormalizedTable::new(columns));
    }
    let mut frame = posts.lazy();
    for metric in metrics {
        if !posts.has_column(metric) {
            frame = frame.with_column(lit(Null {}).cast(DataType::Float64).alias(*metric));
        }
    }
    let data = group_means(
        frame.with_column(bucket.alias(BUCKET)),
        BUCKET,
        metrics,
        Some(POST_COUNT_COLUMN),
    )
    .sort([BUCKET], SortMultipleOptions::default())
    .collect()?;
    let mut table = NormalizedTable::from_frame(data);
    if let Some(labels) = labels {
        table.map_column(BUCKET, |cell| {
            cell.as_f64()
                .and_then(|idx| labels.get(idx as usize))
                .map_or(CellValue::Missing, |label| CellValue::text(*label))
        });
    }
    table.rename_column(BUCKET, label_column)?;
    Ok(table)
}

/// Column a top-posts listing is ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostRanking {
    Likes,
    Retweets,
    Replies,
    #[default]
    TotalEngagement,
    EngagementScore,
}

impl PostRanking {
    pub fn column(self) -> &'static str {
        match self {
            Self::Likes => "likes",
            Self::Retweets => "retweets",
            Self::Replies => "replies",
            Self::TotalEngagement => "total_engagement",
            Self::EngagementScore => "engagement_score",
        }
    }
}

/// The `limit` best posts by `ranking`, best first; ties keep post order.
pub fn top_posts(
    posts: &NormalizedTable,
    ranking: PostRanking,
    limit: usize,
) -> Result<NormalizedTable> {
    let mut ranked = posts.clone();
    ranked.sort_by_column(ranking.column(), true);
    ranked.truncate(limit);
    ranked.select(TOP_POST_COLUMNS)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use pulse_ingest::vendor::twitter::{Attachments, PublicMetrics};

    use super::*;

    fn post(id: &str, day: u32, hour: u32, likes: u64, impressions: u64) -> Post {
        Post {
            id: id.to_string(),
            text: "héllo".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap(),
            public_metrics: PublicMetrics {
                like_count: likes,
                retweet_count: 2,
                reply_count: 1,
                quote_count: 1,
                impression_count: impressions,
            },
            attachments: None,
        }
    }

    fn post_at(day: u32, hour: u32, likes: u64, text_len: usize, media: bool) -> Post {
        let mut p = post(&format!("{day}-{hour}-{likes}"), day, hour, likes, 100);
        p.text = "x".repeat(text_len);
        if media {
            p.attachments = Some(Attachments {
                media_keys: vec!["3_1".to_string()],
            });
        }
        p
    }

    #[test]
    fn derives_engagement_and_timing() {
        // 2024-05-04 is a Saturday.
        let table = posts_table(&[post("1", 4, 13, 6, 200)]);
        assert_eq!(table.value(0, "total_engagement"), Some(CellValue::Count(10)));
        assert_eq!(table.value(0, "engagement_rate"), Some(CellValue::Number(5.0)));
        assert_eq!(table.value(0, "engagement_score"), Some(CellValue::Number(13.0)));
        assert_eq!(table.value(0, "hour_of_day"), Some(CellValue::Count(13)));
        assert_eq!(table.value(0, "day_of_week"), Some(CellValue::Count(5)));
        assert_eq!(table.value(0, "is_weekend"), Some(CellValue::text("true")));
        assert_eq!(table.value(0, "text_length"), Some(CellValue::Count(5)));
    }

    #[test]
    fn zero_impressions_give_zero_rate() {
        assert_eq!(engagement_rate(10, 0), 0.0);
        let table = posts_table(&[post("1", 6, 9, 1, 0)]);
        assert_eq!(table.value(0, "engagement_rate"), Some(CellValue::Number(0.0)));
        assert_eq!(table.value(0, "is_weekend"), Some(CellValue::text("false")));
    }

    #[test]
    fn sums_engagement_per_day() {
        let table = posts_table(&[post("1", 5, 9, 1, 0), post("2", 4, 9, 2, 0), post("3", 5, 20, 3, 0)]);
        let daily = daily_engagement(&table).unwrap();
        assert_eq!(daily.height(), 2);
        assert_eq!(
            daily.value(0, "date"),
            Some(CellValue::Date(NaiveDate::from_ymd_opt(2024, 5, 4).unwrap()))
        );
        assert_eq!(daily.value(1, "likes"), Some(CellValue::Count(4)));
        assert_eq!(daily.value(1, "total_engagement"), Some(CellValue::Count(12)));
    }

    #[test]
    fn total_engagement_saturates() {
        let mut p = post("1", 6, 9, u64::MAX, 0);
        p.public_metrics.retweet_count = 5;
        let table = posts_table(&[p]);
        assert_eq!(table.value(0, "total_engagement"), Some(CellValue::Count(u64::MAX)));
    }

    #[test]
    fn compares_media_means() {
        let table = posts_table(&[
            post_at(6, 9, 10, 20, true),
            post_at(6, 10, 2, 20, false),
            post_at(7, 9, 30, 20, true),
        ]);
        let media = media_comparison(&table).unwrap();
        assert_eq!(media.value(0, "media_type"), Some(CellValue::text("No Media")));
        assert_eq!(media.value(0, "likes"), Some(CellValue::Number(2.0)));
        assert_eq!(media.value(1, "media_type"), Some(CellValue::text("With Media")));
        assert_eq!(media.value(1, "likes"), Some(CellValue::Number(20.0)));
        assert_eq!(media.value(1, POST_COUNT_COLUMN), Some(CellValue::Count(2)));
    }

    #[test]
    fn hours_sort_ascending_with_counts() {
        let table = posts_table(&[
            post_at(6, 22, 4, 10, false),
            post_at(6, 3, 1, 10, false),
            post_at(7, 22, 8, 10, false),
        ]);
        let hourly = hourly_engagement(&table).unwrap();
        assert_eq!(hourly.columns(), ["hour_of_day", "likes", "retweets", "total_engagement", "tweet_count"]);
        assert_eq!(hourly.value(0, "hour_of_day"), Some(CellValue::Count(3)));
        assert_eq!(hourly.value(1, "likes"), Some(CellValue::Number(6.0)));
        assert_eq!(hourly.value(1, POST_COUNT_COLUMN), Some(CellValue::Count(2)));
    }

    #[test]
    fn weekdays_run_monday_to_sunday() {
        // 2024-05-05 is a Sunday, 2024-05-06 a Monday, 2024-05-08 a Wednesday.
        let table = posts_table(&[
            post_at(5, 9, 1, 10, false),
            post_at(8, 9, 2, 10, false),
            post_at(6, 9, 3, 10, false),
        ]);
        let weekdays = weekday_engagement(&table).unwrap();
        let names: Vec<CellValue> = weekdays.column("day_name").unwrap();
        assert_eq!(
            names,
            [CellValue::text("Monday"), CellValue::text("Wednesday"), CellValue::text("Sunday")]
        );
    }

    #[test]
    fn text_lengths_fall_into_bins() {
        let table = posts_table(&[
            post_at(6, 9, 1, 0, false),
            post_at(6, 9, 3, 50, false),
            post_at(6, 9, 5, 51, false),
            post_at(6, 9, 7, 280, false),
            post_at(6, 9, 9, 300, false),
        ]);
        let bins = text_length_engagement(&table).unwrap();
        let labels: Vec<CellValue> = bins.column("text_length_bin").unwrap();
        assert_eq!(
            labels,
            [CellValue::text("0-50"), CellValue::text("51-100"), CellValue::text("251-280")]
        );
        assert_eq!(bins.value(0, "likes"), Some(CellValue::Number(2.0)));
        assert_eq!(bins.value(0, POST_COUNT_COLUMN), Some(CellValue::Count(2)));
    }

    #[test]
    fn counts_posts_per_day() {
        let table = posts_table(&[post_at(7, 9, 1, 5, false), post_at(6, 9, 1, 5, false), post_at(7, 11, 1, 5, false)]);
        let counts = daily_post_counts(&table).unwrap();
        assert_eq!(
            counts.value(0, "date"),
            Some(CellValue::Date(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()))
        );
        assert_eq!(counts.value(1, "count"), Some(CellValue::Count(2)));
    }

    #[test]
    fn top_posts_follow_ranking() {
        let posts: Vec<Post> = (1..=12).map(|likes| post_at(6, 9, likes, 5, false)).collect();
        let table = posts_table(&posts);
        let top = top_posts(&table, PostRanking::Likes, TOP_POST_LIMIT).unwrap();
        assert_eq!(top.height(), 10);
        assert_eq!(top.columns(), TOP_POST_COLUMNS);
        assert_eq!(top.value(0, "likes"), Some(CellValue::Count(12)));
        assert_eq!(top.value(9, "likes"), Some(CellValue::Count(3)));
    }

    #[test]
    fn empty_posts_give_empty_groups() {
        let table = posts_table(&[]);
        assert!(hourly_engagement(&table).unwrap().is_empty());
        assert_eq!(media_comparison(&table).unwrap().width(), MEDIA_METRICS.len() + 2);
        assert!(daily_engagement(&table).unwrap().is_empty());
    }
}
