//! Normalizes the handful of malformed `x-archive-orig-last-modified`
//! header shapes seen in the wild before handing the value to a date
//! parser. Each fix mirrors one specific capture observed in the archive.

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = name.to_ascii_lowercase();
    MONTHS.iter().position(|m| lower.starts_with(m)).map(|i| i as u32 + 1)
}

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:\w+,\s*)?(\d{1,2})[\s-]([A-Za-z]{3,9})[\s-](\d{2,4})\s+(\d{1,2}):(\d{2}):?(\d{2})?\s*(\S+)?",
        )
        .expect("static regex")
    })
}

/// Parse `header`, repairing known-broken shapes first. Returns `None` if
/// the header is absent or still unparseable after repair.
pub fn parse_last_modified(header: &str) -> Option<DateTime<Utc>> {
    let fixed = fix_known_breakage(header);
    let caps = date_regex().captures(&fixed)?;

    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month = month_number(caps.get(2)?.as_str())?;
    let mut year: i32 = caps.get(3)?.as_str().parse().ok()?;
    if year < 100 {
        year += if year < 70 { 2000 } else { 1900 };
    }
    let hour: u32 = caps.get(4)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(5)?.as_str().parse().ok()?;
    let second: u32 = caps.get(6).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);

    Utc.with_ymd_and_hms(year, month, day, hour, minute, second).single()
}

fn fix_known_breakage(header: &str) -> String {
    let mut header = header.to_string();

    // The time zone appears twice, e.g. "Friday, 18-Oct-96 15:48:24 GMT GMT".
    if header.ends_with("GMT GMT") {
        header = header.replace("GMT GMT", "GMT");
    }

    // The time zone isn't delimited from the time, e.g. "... 09:11:11GMT".
    if header.ends_with("GMT") && !header.ends_with(" GMT") {
        header = format!("{} GMT", header.trim_end_matches("GMT"));
    }

    // Minutes and seconds run together, e.g. "Mon, 24 Sep 2001 04:2146 GMT".
    if let Some(time_part) = extract_malformed_time(&header) {
        let fixed_time = format!("{}:{}:{}", &time_part[0..2], &time_part[2..4], &time_part[4..]);
        header = header.replacen(&time_part, &fixed_time, 1);
    }

    // Time is missing entirely, e.g. "Wed, 27 Mar 1996 ? GMT".
    if header.ends_with("? GMT") {
        header = header.replace("? GMT", "00:00:00 GMT");
    }

    header
}

/// Finds a `HH:MMSS` run (one colon, six digits total) that the date regex
/// can't parse, so it can be rewritten to `HH:MM:SS`.
fn extract_malformed_time(header: &str) -> Option<String> {
    for token in header.split_whitespace() {
        let parts: Vec<&str> = token.split(':').collect();
        if parts.len() == 2
            && parts[0].len() == 2
            && parts[0].chars().all(|c| c.is_ascii_digit())
            && parts[1].len() == 4
            && parts[1].chars().all(|c| c.is_ascii_digit())
        {
            return Some(token.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixes_doubled_timezone() {
        let parsed = parse_last_modified("Friday, 18-Oct-96 15:48:24 GMT GMT");
        assert!(parsed.is_some());
        assert_eq!(parsed.unwrap().format("%Y-%m-%d").to_string(), "1996-10-18");
    }

    #[test]
    fn fixes_undelimited_timezone() {
        let parsed = parse_last_modified("Sun, 13 Aug 2006 09:11:11GMT");
        assert!(parsed.is_some());
    }

    #[test]
    fn fixes_undelimited_minutes_seconds() {
        let parsed = parse_last_modified("Mon, 24 Sep 2001 04:2146 GMT");
        assert!(parsed.is_some());
        let dt = parsed.unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "04:21");
    }

    #[test]
    fn fixes_missing_time() {
        let parsed = parse_last_modified("Wed, 27 Mar 1996 ? GMT");
        assert!(parsed.is_some());
    }

    #[test]
    fn well_formed_header_parses_unchanged() {
        let parsed = parse_last_modified("Wed, 27 Mar 1996 00:00:00 GMT");
        assert!(parsed.is_some());
    }

    #[test]
    fn garbage_returns_none() {
        assert!(parse_last_modified("not a date").is_none());
    }
}
