//! The compilation's sidecar `.txt` (spec §4.12): one `HH:MM:SS title
//! metadata (date) emojis` line per recording plus a trailing summary.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SidecarEntry {
    pub start_offset: Duration,
    pub title: String,
    pub metadata: Option<String>,
    pub date: String,
    pub emojis: Option<String>,
}

pub fn format_timestamp(offset: Duration) -> String {
    let total_seconds = offset.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

fn format_entry(entry: &SidecarEntry) -> String {
    let mut parts = vec![format_timestamp(entry.start_offset), entry.title.clone()];
    if let Some(metadata) = &entry.metadata {
        parts.push(metadata.clone());
    }
    parts.push(format!("({})", entry.date));
    if let Some(emojis) = &entry.emojis {
        parts.push(emojis.clone());
    }
    parts.join(" ")
}

pub fn render_sidecar(entries: &[SidecarEntry], summary: &str) -> String {
    let mut lines: Vec<String> = entries.iter().map(format_entry).collect();
    lines.push(String::new());
    lines.push(summary.to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_hh_mm_ss() {
        assert_eq!(format_timestamp(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_timestamp(Duration::from_secs(3725)), "01:02:05");
    }

    #[test]
    fn renders_entry_line_with_optional_fields() {
        let entry = SidecarEntry {
            start_offset: Duration::from_secs(65),
            title: "A Page".to_string(),
            metadata: Some("views: 10".to_string()),
            date: "2002-01-20".to_string(),
            emojis: Some("\u{1FA9E}".to_string()),
        };
        assert_eq!(format_entry(&entry), "00:01:05 A Page views: 10 (2002-01-20) \u{1FA9E}");
    }

    #[test]
    fn renders_entry_without_optional_fields() {
        let entry = SidecarEntry {
            start_offset: Duration::from_secs(0),
            title: "A Page".to_string(),
            metadata: None,
            date: "2002-01-20".to_string(),
            emojis: None,
        };
        assert_eq!(format_entry(&entry), "00:00:00 A Page (2002-01-20)");
    }

    #[test]
    fn render_sidecar_ends_with_summary() {
        let entries = vec![SidecarEntry {
            start_offset: Duration::from_secs(0),
            title: "A Page".to_string(),
            metadata: None,
            date: "2002-01-20".to_string(),
            emojis: None,
        }];
        let rendered = render_sidecar(&entries, "3 recordings, 00:05:00 total");
        assert!(rendered.ends_with("3 recordings, 00:05:00 total"));
    }
}
