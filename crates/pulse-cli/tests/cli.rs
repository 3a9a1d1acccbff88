//! End-to-end runs of the CLI commands over saved responses.

use std::fs;
use std::path::{Path, PathBuf};

use pulse_cli::cli::{
    CampaignArgs, CompareArgs, ConfigCheckArgs, PagesenseArgs, PostArgs, RangeArgs, RankingArg,
    ReportArgs, ReportKindArg,
};
use pulse_cli::commands::{
    run_campaigns, run_compare, run_config_check, run_pagesense, run_posts, run_report,
};
use pulse_cli::config::{ConfigError, PulseConfig, Source};
use pulse_model::{CellValue, ReportKind, TRAFFIC_REQUIRED_COLUMNS};
use tempfile::TempDir;

const REFUSED: &str = r#"{
  "error": {
    "code": 400,
    "message": "Field newUsers is not valid for this property",
    "status": "INVALID_ARGUMENT"
  }
}"#;

const SERVER_ERROR: &str = r#"{
  "error": { "code": 503, "message": "The service is unavailable", "status": "UNAVAILABLE" }
}"#;

const REDUCED_TRAFFIC: &str = r#"{
  "dimensionHeaders": [{ "name": "date" }],
  "metricHeaders": [
    { "name": "totalUsers" },
    { "name": "screenPageViews" },
    { "name": "bounceRate" },
    { "name": "averageSessionDuration" },
    { "name": "sessions" }
  ],
  "rows": [
    {
      "dimensionValues": [{ "value": "20240102" }],
      "metricValues": [{ "value": "200" }, { "value": "400" }, { "value": "0.5" }, { "value": "30" }, { "value": "220" }]
    },
    {
      "dimensionValues": [{ "value": "20240101" }],
      "metricValues": [{ "value": "100" }, { "value": "150" }, { "value": "0.4" }, { "value": "20" }, { "value": "110" }]
    }
  ]
}"#;

fn landing_pages(rows: &[(&str, &str)]) -> String {
    let rows: Vec<String> = rows
        .iter()
        .map(|(page, sessions)| {
            format!(
                r#"{{"dimensionValues":[{{"value":"{page}"}}],"metricValues":[{{"value":"1"}},{{"value":"1"}},{{"value":"{sessions}"}},{{"value":"0.5"}},{{"value":"10"}}]}}"#
            )
        })
        .collect();
    format!(
        r#"{{"dimensionHeaders":[{{"name":"landingPage"}}],"metricHeaders":[{{"name":"activeUsers"}},{{"name":"newUsers"}},{{"name":"sessions"}},{{"name":"bounceRate"}},{{"name":"averageSessionDuration"}}],"rows":[{}]}}"#,
        rows.join(",")
    )
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn report_args(response: PathBuf, reduced: Option<PathBuf>) -> ReportArgs {
    ReportArgs {
        response,
        reduced,
        range: RangeArgs {
            start: None,
            end: None,
        },
        output: None,
    }
}

#[test]
fn traffic_falls_back_to_reduced_response() {
    let dir = TempDir::new().unwrap();
    let primary = write(dir.path(), "traffic.json", REFUSED);
    let reduced = write(dir.path(), "traffic_reduced.json", REDUCED_TRAFFIC);
    let mut args = report_args(primary, Some(reduced));
    let csv_path = dir.path().join("out").join("traffic.csv");
    args.output = Some(csv_path.clone());

    let output = run_report(ReportKind::Traffic, &args).unwrap();
    assert_eq!(output.warnings.len(), 1);
    assert!(output.warnings[0].contains("newUsers is not valid"));

    let section = &output.sections[0];
    let table = &section.table;
    for column in TRAFFIC_REQUIRED_COLUMNS {
        assert!(table.has_column(column), "missing {column}");
    }
    assert!(table.is_estimated("newUsers"));
    assert!(table.is_estimated("returningUsers"));
    assert_eq!(table.value(0, "newUsers"), Some(CellValue::Number(70.0)));

    let total = section
        .headlines
        .iter()
        .find(|h| h.label == "Total Users")
        .unwrap();
    assert_eq!(total.display, "300");

    let csv = fs::read_to_string(csv_path).unwrap();
    assert!(csv.starts_with("date,totalUsers,activeUsers,newUsers,avgEngPerUser"));
    assert!(csv.lines().nth(1).unwrap().starts_with("2024-01-01,100,100,70,"));
}

#[test]
fn refused_request_without_reduced_response_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let primary = write(dir.path(), "search.json", REFUSED);
    let output = run_report(ReportKind::Search, &report_args(primary, None)).unwrap();
    assert!(output.warnings[0].contains("not available"));
    assert!(output.sections[0].table.is_empty());
}

#[test]
fn server_error_is_not_retried() {
    let dir = TempDir::new().unwrap();
    let primary = write(dir.path(), "traffic.json", SERVER_ERROR);
    let reduced = write(dir.path(), "traffic_reduced.json", REDUCED_TRAFFIC);
    let output = run_report(ReportKind::Traffic, &report_args(primary, Some(reduced))).unwrap();
    assert!(output.warnings[0].contains("503"));
    let table = &output.sections[0].table;
    assert!(table.is_empty());
    assert_eq!(table.columns()[0], "date");
}

#[test]
fn compare_landing_pages_between_periods() {
    let dir = TempDir::new().unwrap();
    let previous = write(
        dir.path(),
        "previous.json",
        &landing_pages(&[("/home", "10"), ("/old", "4")]),
    );
    let current = write(
        dir.path(),
        "current.json",
        &landing_pages(&[("/home", "15"), ("/new", "3")]),
    );
    let args = CompareArgs {
        report: ReportKindArg::LandingPages,
        previous,
        current,
        key: None,
        metrics: vec!["sessions".to_string()],
        channels: Vec::new(),
        output: None,
    };
    let output = run_compare(&args).unwrap();
    let table = &output.sections[0].table;
    assert_eq!(
        table.columns(),
        [
            "landingPage",
            "sessions (Period 1)",
            "sessions (Period 2)",
            "sessions Change"
        ]
    );
    assert_eq!(table.value(0, "sessions Change"), Some(CellValue::text("50.00%")));
    assert_eq!(table.value(1, "sessions Change"), Some(CellValue::text("-100.00%")));
    assert_eq!(table.value(2, "sessions Change"), Some(CellValue::text("New")));
}

#[test]
fn pagesense_skips_unknown_layouts() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "pages.csv",
        "Pages report\nPage,Page Views,Average Time on page\n/home,12,2m 5s\n",
    );
    write(dir.path(), "other.csv", "Other report\nUrl,Hits\n/home,3\n");
    let csv_path = dir.path().join("merged.csv");
    let args = PagesenseArgs {
        inputs: vec![dir.path().to_path_buf()],
        filter_source: None,
        banner_rows: 1,
        output: Some(csv_path.clone()),
        include_hidden: false,
    };
    let output = run_pagesense(&args).unwrap();
    assert_eq!(output.warnings, ["other.csv: unknown report layout, skipped"]);
    assert_eq!(output.sections[0].table.height(), 1);
    let csv = fs::read_to_string(csv_path).unwrap();
    insta::assert_snapshot!(csv, @r"
    Page,Page Views,Average Time on page
    /home,12,125
    ");
}

#[test]
fn config_file_supplies_credentials() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "pulse.toml",
        "[twitter]\nbearer_token = \"token\"\nuser_id = \"42\"\n\n[cache]\nttl_seconds = 60\n",
    );
    let config = PulseConfig::load(Some(&path)).unwrap();
    assert_eq!(config.cache.ttl_seconds, 60);

    let results = run_config_check(
        Some(&path),
        &ConfigCheckArgs {
            source: Some(Source::Twitter),
        },
    )
    .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].1.is_ok());
}

#[test]
fn config_check_lists_every_source() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "pulse.toml", "[ga4]\nproperty_id = \"123\"\n");
    let results = run_config_check(Some(&path), &ConfigCheckArgs { source: None }).unwrap();
    let sources: Vec<Source> = results.iter().map(|(source, _)| *source).collect();
    assert_eq!(sources, Source::ALL);
    let ga4 = results[0].1.as_ref().unwrap_err();
    assert!(matches!(
        ga4,
        ConfigError::Missing {
            key: "ga4.service_account_file",
            ..
        }
    ));
}

#[test]
fn explicit_config_path_must_exist() {
    let dir = TempDir::new().unwrap();
    let err = PulseConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

fn no_range() -> RangeArgs {
    RangeArgs {
        start: None,
        end: None,
    }
}

#[test]
fn campaigns_add_rankings_and_audience() {
    let dir = TempDir::new().unwrap();
    let campaigns = write(
        dir.path(),
        "campaigns.json",
        r#"{"campaigns": [
            {"id": "a", "settings": {"title": "Spring"}, "send_time": "2024-03-04T09:00:00+00:00",
             "emails_sent": 10, "report_summary": {"open_rate": 0.5, "click_rate": 0.1}},
            {"id": "b", "settings": {"title": "Summer"}, "send_time": "2024-06-04T09:00:00+00:00",
             "emails_sent": 20, "report_summary": {"open_rate": 0.7, "click_rate": 0.2}}]}"#,
    );
    let reports = write(dir.path(), "reports.json", r#"{"reports": []}"#);
    let activity = write(
        dir.path(),
        "activity.json",
        r#"{"emails": [
            {"email_address": "a@example.com", "opens_count": 2, "clicks_count": 1},
            {"email_address": "b@example.com"}]}"#,
    );
    let args = CampaignArgs {
        campaigns,
        reports,
        growth: None,
        activity: Some(activity),
        range: no_range(),
        output: None,
    };
    let output = run_campaigns(&args).unwrap();
    let titles: Vec<&str> = output.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(
        titles,
        [
            "Email campaigns",
            "Best campaigns by open rate",
            "Monthly performance",
            "Audience overview",
            "Subscriber activity"
        ]
    );
    assert_eq!(
        output.sections[1].table.value(0, "Campaign Name"),
        Some(CellValue::text("Summer"))
    );
    assert_eq!(output.sections[2].table.height(), 2);
    assert_eq!(output.sections[4].table.height(), 2);
}

#[test]
fn posts_with_breakdowns() {
    let dir = TempDir::new().unwrap();
    let timeline = write(
        dir.path(),
        "timeline.json",
        r#"{"data": [
            {"id": "1", "text": "short", "created_at": "2024-05-06T09:00:00Z",
             "public_metrics": {"like_count": 3}, "attachments": {"media_keys": ["3_1"]}},
            {"id": "2", "text": "also short", "created_at": "2024-05-07T18:00:00Z",
             "public_metrics": {"like_count": 9}}]}"#,
    );
    let args = PostArgs {
        timeline,
        daily: false,
        breakdowns: true,
        top_by: RankingArg::Likes,
        range: no_range(),
        output: None,
    };
    let output = run_posts(&args).unwrap();
    assert_eq!(output.sections.len(), 7);
    assert_eq!(output.sections[1].table.height(), 2);
    let top = &output.sections[6].table;
    assert_eq!(output.sections[6].title, "Top posts");
    assert_eq!(top.value(0, "likes"), Some(CellValue::Count(9)));
}
