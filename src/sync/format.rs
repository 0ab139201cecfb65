//! Display conversions. Pure functions, no state.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::config::TimeUnit;

pub const PLACEHOLDER: &str = "—";

pub fn temperature(celsius: f64) -> String {
    format!("{celsius:.1} °C")
}

pub fn humidity(percent: f64) -> String {
    format!("{percent:.0} %")
}

/// Shortest plain rendering: `0.4`, `42`, `12.5`.
pub fn number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

pub fn one_decimal(value: f64) -> String {
    format!("{value:.1}")
}

/// Zero-padded `HH:MM` from a duration in whole minutes; the hour part grows
/// past two digits for very long jobs. Negative or non-finite input has no
/// display form.
pub fn duration_hhmm(value: f64, unit: TimeUnit) -> Option<String> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let minutes = match unit {
        TimeUnit::Minutes => value,
        TimeUnit::Seconds => value / 60.0,
    };
    let total = minutes.floor() as u64;
    Some(format!("{:02}:{:02}", total / 60, total % 60))
}

pub fn label(flag: bool, on: &'static str, off: &'static str) -> &'static str {
    if flag { on } else { off }
}

/// Normalize `H:MM[:SS]` to `HH:MM`.
pub fn clock_hhmm(raw: &str) -> Option<String> {
    let (hours, rest) = raw.trim().split_once(':')?;
    let minutes = rest.get(..2)?;
    if hours.is_empty()
        || hours.len() > 2
        || !hours.chars().all(|c| c.is_ascii_digit())
        || !minutes.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    Some(format!("{hours:0>2}:{minutes}"))
}

pub fn rate(c_per_h: f64) -> String {
    format!("{c_per_h:.2} °C/h")
}

pub fn power_suffix(watts: Option<f64>) -> String {
    match watts {
        Some(w) if w.is_finite() => format!(" ({} W)", round_half_up(w)),
        _ => String::new(),
    }
}

pub fn with_unit(value: f64, unit: &str, digits: usize) -> String {
    format!("{value:.digits$}{unit}")
}

pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Lowercase ASCII slug used for per-location target ids.
pub fn slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "default".to_string()
    } else {
        slug
    }
}

/// RFC 3339 timestamps, or naive `YYYY-MM-DDTHH:MM:SS[.f]` read as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
}

pub fn local_timestamp(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_has_one_decimal_and_unit() {
        assert_eq!(temperature(57.34), "57.3 °C");
        assert_eq!(temperature(21.0), "21.0 °C");
        assert_eq!(temperature(-3.26), "-3.3 °C");
    }

    #[test]
    fn remaining_time_is_zero_padded() {
        assert_eq!(duration_hhmm(125.0, TimeUnit::Minutes).as_deref(), Some("02:05"));
        assert_eq!(duration_hhmm(59.9, TimeUnit::Minutes).as_deref(), Some("00:59"));
        assert_eq!(duration_hhmm(7500.0, TimeUnit::Seconds).as_deref(), Some("02:05"));
        assert_eq!(duration_hhmm(6000.0, TimeUnit::Minutes).as_deref(), Some("100:00"));
        assert_eq!(duration_hhmm(-1.0, TimeUnit::Minutes), None);
        assert_eq!(duration_hhmm(f64::NAN, TimeUnit::Minutes), None);
    }

    #[test]
    fn numbers_print_like_the_dashboard() {
        assert_eq!(number(0.4), "0.4");
        assert_eq!(number(42.0), "42");
        assert_eq!(number(-0.0), "0");
        assert_eq!(humidity(45.4), "45 %");
        assert_eq!(with_unit(0.187, " A", 2), "0.19 A");
    }

    #[test]
    fn clock_values_are_normalized() {
        assert_eq!(clock_hhmm("7:05").as_deref(), Some("07:05"));
        assert_eq!(clock_hhmm("22:30:15").as_deref(), Some("22:30"));
        assert_eq!(clock_hhmm("noon"), None);
        assert_eq!(clock_hhmm("123:00"), None);
    }

    #[test]
    fn rates_and_power() {
        assert_eq!(rate(-0.5234), "-0.52 °C/h");
        assert_eq!(power_suffix(Some(310.4)), " (310 W)");
        assert_eq!(power_suffix(Some(2.5)), " (3 W)");
        assert_eq!(power_suffix(None), "");
    }

    #[test]
    fn slugs() {
        assert_eq!(slug("Tietokonepöytä"), "tietokonep-yt");
        assert_eq!(slug("  Living Room #2 "), "living-room-2");
        assert_eq!(slug("***"), "default");
    }

    #[test]
    fn timestamps() {
        let ts = parse_timestamp("2025-01-15T10:00:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-01-15T08:00:00+00:00");
        assert!(parse_timestamp("2025-01-15T10:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert_eq!(local_timestamp("garbage"), PLACEHOLDER);
    }
}
