//! Report-shape descriptors.
//!
//! A [`ReportShape`] tells the normalizer everything that differs between
//! report types: which columns a request asks for, which reduced request to
//! retry with, which columns must exist in the output, and how rows rank.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Columns coerced from string to floating point during base normalization.
pub const KNOWN_NUMERIC_COLUMNS: &[&str] = &[
    "totalUsers",
    "activeUsers",
    "newUsers",
    "userEngagementDuration",
    "engagementRate",
    "averageSessionDuration",
    "bounceRate",
    "screenPageViews",
    "sessions",
    "impressions",
    "clicks",
    "organicGoogleSearchImpressions",
    "organicGoogleSearchClicks",
    "organicGoogleSearchClickThroughRate",
    "organicSearches",
];

/// Output columns guaranteed by the web-traffic report, in display order.
pub const TRAFFIC_REQUIRED_COLUMNS: &[&str] = &[
    "date",
    "totalUsers",
    "activeUsers",
    "newUsers",
    "avgEngPerUser",
    "userEngagementDuration",
    "returningUsers",
    "userStickiness",
    "engagementRate",
    "averageSessionDuration",
    "bounceRate",
    "screenPageViews",
];

/// Search metrics filled with zero when the vendor omits them.
pub const SEARCH_FILLED_COLUMNS: &[&str] = &[
    "organicSearches",
    "impressions",
    "clicks",
    "organicGoogleSearchImpressions",
    "organicGoogleSearchClicks",
];

pub const SEARCH_CTR_COLUMN: &str = "organicGoogleSearchClickThroughRate";

/// Channels reported by the channel comparison when none are given.
pub const DEFAULT_CHANNELS: &[&str] = &["Direct", "Organic Search", "Organic Social"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Traffic,
    Search,
    TopPages,
    Keywords,
    LandingPages,
    Channels,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::Traffic,
        ReportKind::Search,
        ReportKind::TopPages,
        ReportKind::Keywords,
        ReportKind::LandingPages,
        ReportKind::Channels,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Traffic => "Web traffic",
            Self::Search => "Search performance",
            Self::TopPages => "Top pages",
            Self::Keywords => "Top keywords",
            Self::LandingPages => "Landing pages",
            Self::Channels => "Channel breakdown",
        }
    }

    pub fn shape(self) -> ReportShape {
        match self {
            Self::Traffic => ReportShape {
                kind: self,
                dimensions: &["date"],
                metrics: &[
                    "totalUsers",
                    "activeUsers",
                    "newUsers",
                    "userEngagementDuration",
                    "engagementRate",
                    "averageSessionDuration",
                    "bounceRate",
                    "screenPageViews",
                    "sessions",
                ],
                reduced: Some(ReducedRequest {
                    dimensions: &["date"],
                    metrics: &[
                        "totalUsers",
                        "screenPageViews",
                        "bounceRate",
                        "averageSessionDuration",
                        "sessions",
                    ],
                }),
                required_columns: TRAFFIC_REQUIRED_COLUMNS,
                ranking_metric: None,
                coerce_all_metrics: false,
                limit: None,
            },
            Self::Search => ReportShape {
                kind: self,
                dimensions: &["date"],
                metrics: &[
                    "impressions",
                    "clicks",
                    "organicGoogleSearchImpressions",
                    "organicGoogleSearchClicks",
                    "organicGoogleSearchClickThroughRate",
                    "organicSearches",
                ],
                reduced: Some(ReducedRequest {
                    dimensions: &["date"],
                    metrics: &["organicSearches", "sessions"],
                }),
                required_columns: &[],
                ranking_metric: None,
                coerce_all_metrics: false,
                limit: None,
            },
            Self::TopPages => ReportShape {
                kind: self,
                dimensions: &["pagePath"],
                metrics: &[
                    "screenPageViews",
                    "activeUsers",
                    "engagementRate",
                    "averageSessionDuration",
                ],
                reduced: None,
                required_columns: &[],
                ranking_metric: Some("screenPageViews"),
                coerce_all_metrics: true,
                limit: Some(10),
            },
            Self::Keywords => ReportShape {
                kind: self,
                dimensions: &["sessionSource", "sessionMedium", "searchTerm"],
                metrics: &["sessions", "activeUsers", "engagementRate"],
                reduced: Some(ReducedRequest {
                    dimensions: &["sessionSource", "sessionMedium"],
                    metrics: &["sessions", "activeUsers"],
                }),
                required_columns: &[],
                ranking_metric: Some("sessions"),
                coerce_all_metrics: true,
                limit: Some(10),
            },
            Self::LandingPages => ReportShape {
                kind: self,
                dimensions: &["landingPage"],
                metrics: &[
                    "activeUsers",
                    "newUsers",
                    "sessions",
                    "bounceRate",
                    "averageSessionDuration",
                ],
                reduced: None,
                required_columns: &[],
                ranking_metric: Some("sessions"),
                coerce_all_metrics: true,
                limit: Some(10),
            },
            Self::Channels => ReportShape {
                kind: self,
                dimensions: &["sessionDefaultChannelGrouping", "deviceCategory", "country"],
                metrics: &[
                    "activeUsers",
                    "newUsers",
                    "sessions",
                    "engagedSessions",
                    "bounceRate",
                ],
                reduced: None,
                required_columns: &[],
                ranking_metric: None,
                coerce_all_metrics: true,
                limit: None,
            },
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reduced dimension/metric set retried when the primary request is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReducedRequest {
    pub dimensions: &'static [&'static str],
    pub metrics: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportShape {
    pub kind: ReportKind,
    pub dimensions: &'static [&'static str],
    pub metrics: &'static [&'static str],
    pub reduced: Option<ReducedRequest>,
    /// Columns every output row must carry (empty for free-form shapes).
    pub required_columns: &'static [&'static str],
    /// Metric ranked rows are sorted by, descending.
    pub ranking_metric: Option<&'static str>,
    /// Coerce every declared metric, not only the known numeric columns.
    pub coerce_all_metrics: bool,
    pub limit: Option<usize>,
}

impl ReportShape {
    /// Columns of the primary request, dimensions first.
    pub fn declared_columns(&self) -> Vec<String> {
        self.dimensions
            .iter()
            .chain(self.metrics)
            .map(|s| (*s).to_string())
            .collect()
    }

    pub fn is_numeric_column(&self, name: &str) -> bool {
        KNOWN_NUMERIC_COLUMNS.contains(&name)
            || (self.coerce_all_metrics && self.metrics.contains(&name))
    }

    pub fn primary_request(&self, range: DateRange) -> ReportRequest {
        ReportRequest {
            kind: self.kind,
            date_range: range,
            dimensions: to_owned(self.dimensions),
            metrics: to_owned(self.metrics),
            order_by: self.ranking_metric.map(str::to_string),
            limit: self.limit,
        }
    }

    pub fn reduced_request(&self, range: DateRange) -> Option<ReportRequest> {
        self.reduced.map(|reduced| ReportRequest {
            kind: self.kind,
            date_range: range,
            dimensions: to_owned(reduced.dimensions),
            metrics: to_owned(reduced.metrics),
            order_by: self.ranking_metric.map(str::to_string),
            limit: self.limit,
        })
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// What a vendor collaborator is asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub kind: ReportKind,
    pub date_range: DateRange,
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    /// Metric to order by, descending.
    pub order_by: Option<String>,
    pub limit: Option<usize>,
}
