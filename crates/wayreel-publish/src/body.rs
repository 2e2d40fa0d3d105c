//! Publication status-body composition (spec §4.11): `title (truncated to
//! budget), display_metadata?, short_date, wayback_url, plugin_emoji?`.

use wayreel_types::url_key::{Modifier, WaybackUrl};
use wayreel_types::Snapshot;

pub const PLUGIN_EMOJI: &str = "\u{1FA9E}"; // mirror/legacy-content marker

/// Truncate `text` to at most `budget` Unicode scalar values, appending an
/// ellipsis if it had to cut, without splitting in the middle of a
/// multi-byte character.
pub fn truncate_title(title: &str, budget: usize) -> String {
    let chars: Vec<char> = title.chars().collect();
    if chars.len() <= budget {
        return title.to_string();
    }
    if budget == 0 {
        return String::new();
    }
    let cut: String = chars[..budget.saturating_sub(1)].iter().collect();
    format!("{cut}\u{2026}")
}

pub fn short_date(timestamp_14: &str) -> String {
    if timestamp_14.len() < 8 {
        return timestamp_14.to_string();
    }
    format!("{}-{}-{}", &timestamp_14[0..4], &timestamp_14[4..6], &timestamp_14[6..8])
}

pub fn wayback_url(snapshot: &Snapshot) -> String {
    WaybackUrl::new(&snapshot.timestamp, Some(Modifier::Iframe), &snapshot.url).compose()
}

/// Build the full status body text for a publication.
pub fn status_body(snapshot: &Snapshot, title_budget: usize, display_metadata: Option<&str>) -> String {
    let title = snapshot.page_title.as_deref().unwrap_or(&snapshot.url);
    let mut lines = vec![truncate_title(title, title_budget)];
    if let Some(metadata) = display_metadata {
        lines.push(metadata.to_string());
    }
    lines.push(short_date(&snapshot.timestamp));
    lines.push(wayback_url(snapshot));
    if snapshot.page_uses_plugins {
        lines.push(PLUGIN_EMOJI.to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn base_snapshot() -> Snapshot {
        Snapshot {
            id: 1,
            parent_id: None,
            depth: 0,
            state: 4,
            priority: 0,
            is_initial: true,
            is_excluded: false,
            is_media: false,
            page_language: None,
            page_title: Some("A Very Long Page Title That Needs Truncating".to_string()),
            page_uses_plugins: true,
            media_extension: None,
            media_title: None,
            media_author: None,
            scout_time: None,
            url: "http://example.com/".to_string(),
            timestamp: "20020120142510".to_string(),
            last_modified_time: None,
            url_key: "com,example)/".to_string(),
            digest: None,
            is_sensitive_override: None,
            options: Value::Null,
        }
    }

    #[test]
    fn truncates_with_ellipsis() {
        assert_eq!(truncate_title("hello world", 5), "hell\u{2026}");
        assert_eq!(truncate_title("hi", 5), "hi");
        assert_eq!(truncate_title("hi", 0), "");
    }

    #[test]
    fn short_date_splits_yyyymmdd() {
        assert_eq!(short_date("20020120142510"), "2002-01-20");
    }

    #[test]
    fn status_body_includes_plugin_emoji_when_present() {
        let snapshot = base_snapshot();
        let body = status_body(&snapshot, 20, Some("views: 42"));
        assert!(body.contains("views: 42"));
        assert!(body.contains("2002-01-20"));
        assert!(body.contains(PLUGIN_EMOJI));
        assert!(body.contains("web.archive.org"));
    }
}
