use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;

use crate::state::SnapshotState;

/// One archived capture of a URL at a timestamp (spec §3).
///
/// Modeled as a flat row-populated struct the way
/// `rootsignal-archive::store::StoredInteraction` is: database joins attach
/// extra columns via [`SnapshotInfo`] rather than subclassing this type.
#[derive(Debug, Clone, FromRow)]
pub struct Snapshot {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub depth: i32,
    pub state: i64,
    pub priority: i64,
    pub is_initial: bool,
    pub is_excluded: bool,
    pub is_media: bool,
    pub page_language: Option<String>,
    pub page_title: Option<String>,
    pub page_uses_plugins: bool,
    pub media_extension: Option<String>,
    pub media_title: Option<String>,
    pub media_author: Option<String>,
    pub scout_time: Option<DateTime<Utc>>,
    pub url: String,
    pub timestamp: String,
    pub last_modified_time: Option<DateTime<Utc>>,
    pub url_key: String,
    pub digest: Option<String>,
    pub is_sensitive_override: Option<bool>,
    pub options: Value,
}

impl Snapshot {
    pub fn state(&self) -> SnapshotState {
        // A row read back from our own schema always carries a value this
        // crate wrote; an unknown integer here means schema drift, not bad
        // input, so it is a panic rather than a recoverable error.
        SnapshotState::from_i64(self.state).expect("snapshot row has invalid state")
    }

    /// `oldest_timestamp = min(timestamp, last_modified_time)` only when
    /// `last_modified_time` looks like it postdates the Web's existence
    /// (spec §8's "oldest-timestamp rule"). `last_modified_time` values
    /// before 1991 or in the future are treated as unreliable archive
    /// metadata and ignored.
    pub fn oldest_timestamp(&self) -> String {
        let Some(last_modified) = self.last_modified_time.as_ref() else {
            return self.timestamp.clone();
        };
        let year: i32 = last_modified.format("%Y").to_string().parse().unwrap_or(0);
        if year < 1991 || *last_modified > Utc::now() {
            return self.timestamp.clone();
        }
        let lm_ts = last_modified.format("%Y%m%d%H%M%S").to_string();
        std::cmp::min(lm_ts, self.timestamp.clone())
    }

    /// `min(year(timestamp), year(last_modified_time))` (spec §3's
    /// `oldest_year` projection), honoring the same 1991/future guard as
    /// [`Self::oldest_timestamp`].
    pub fn oldest_year(&self) -> i32 {
        let ts_year: i32 = self.timestamp[..4].parse().unwrap_or(0);
        let Some(last_modified) = self.last_modified_time.as_ref() else {
            return ts_year;
        };
        let lm_year: i32 = last_modified.format("%Y").to_string().parse().unwrap_or(0);
        if lm_year < 1991 || *last_modified > Utc::now() {
            return ts_year;
        }
        ts_year.min(lm_year)
    }
}

/// `(parent_id, child_id)` edge in the observed link graph. Distinct from
/// `Snapshot::parent_id`, which is only the breadcrumb of first discovery
/// (spec §9 "Cyclic graph").
#[derive(Debug, Clone, Copy, FromRow)]
pub struct Topology {
    pub parent_id: i64,
    pub child_id: i64,
}

/// The `SnapshotInfo` derived view (spec §3): a [`Snapshot`] plus the
/// computed projections that only make sense for a scouted-or-later row.
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    pub snapshot: Snapshot,
    /// `NULL` for state == QUEUED, i.e. not yet scored.
    pub points: Option<f64>,
    pub is_sensitive: bool,
    pub oldest_year: i32,
    pub url_host: String,
}

impl std::ops::Deref for SnapshotInfo {
    type Target = Snapshot;
    fn deref(&self) -> &Snapshot {
        &self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_snapshot(timestamp: &str, last_modified: Option<DateTime<Utc>>) -> Snapshot {
        Snapshot {
            id: 1,
            parent_id: None,
            depth: 0,
            state: SnapshotState::Scouted.as_i64(),
            priority: 0,
            is_initial: true,
            is_excluded: false,
            is_media: false,
            page_language: None,
            page_title: None,
            page_uses_plugins: false,
            media_extension: None,
            media_title: None,
            media_author: None,
            scout_time: None,
            url: "http://example.com/".to_string(),
            timestamp: timestamp.to_string(),
            last_modified_time: last_modified,
            url_key: "com,example)/".to_string(),
            digest: None,
            is_sensitive_override: None,
            options: Value::Null,
        }
    }

    #[test]
    fn oldest_timestamp_falls_back_when_no_last_modified() {
        let s = base_snapshot("20020101000000", None);
        assert_eq!(s.oldest_timestamp(), "20020101000000");
    }

    #[test]
    fn oldest_timestamp_ignores_pre_web_dates() {
        use chrono::TimeZone;
        let lm = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        let s = base_snapshot("20020101000000", Some(lm));
        assert_eq!(s.oldest_timestamp(), "20020101000000");
    }
}
