//! Duration parsing and display.

use std::sync::LazyLock;

use regex::Regex;

/// Exported-report durations: `"{m}m {s}s"` or `"{s}s"`.
static CLOCK_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(\d+)m )?(\d+)s").expect("Invalid clock duration regex"));

/// ISO 8601 durations as reported for videos (`PT1H2M3S`, `P1DT5M`).
static ISO8601_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$")
        .expect("Invalid ISO 8601 duration regex")
});

/// Total seconds of a clock-style duration; empty or unparseable input is 0.
pub fn parse_clock_duration(raw: &str) -> u64 {
    let Some(caps) = CLOCK_DURATION.captures(raw) else {
        return 0;
    };
    let minutes = caps
        .get(1)
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(0);
    let seconds = caps
        .get(2)
        .and_then(|s| s.as_str().parse::<u64>().ok())
        .unwrap_or(0);
    minutes.saturating_mul(60).saturating_add(seconds)
}

/// Total seconds of an ISO 8601 duration, or `None` when it does not parse.
pub fn parse_iso8601_duration(raw: &str) -> Option<f64> {
    let caps = ISO8601_DURATION.captures(raw.trim())?;
    let part = |idx: usize| -> f64 {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    Some(part(1) * 86_400.0 + part(2) * 3_600.0 + part(3) * 60.0 + part(4))
}

/// Human-readable duration: `"{s:.1} sec"` under a minute, otherwise
/// `"{m}m {s}s"` with whole seconds.
pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds / 60.0).floor();
    let rest = seconds - minutes * 60.0;
    if minutes < 1.0 {
        format!("{rest:.1} sec")
    } else {
        format!("{minutes:.0}m {rest:.0}s")
    }
}
