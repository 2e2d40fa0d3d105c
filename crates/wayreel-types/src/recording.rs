use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One recorded capture of a Snapshot. Exactly one "unprocessed" Recording
/// per snapshot is eligible for publishing (spec §3).
#[derive(Debug, Clone, FromRow)]
pub struct Recording {
    pub id: i64,
    pub snapshot_id: i64,
    pub is_processed: bool,
    pub has_audio: bool,
    pub upload_filename: String,
    pub archive_filename: Option<String>,
    pub text_to_speech_filename: Option<String>,
    pub creation_time: DateTime<Utc>,
    pub publish_time: Option<DateTime<Utc>>,
    pub twitter_id: Option<String>,
    pub mastodon_id: Option<String>,
    pub tumblr_id: Option<String>,
    pub bluesky_id: Option<String>,
}

/// Missing-asset backfill log row produced during recording (spec §3).
#[derive(Debug, Clone, FromRow)]
pub struct SavedUrl {
    pub id: i64,
    pub snapshot_id: i64,
    pub recording_id: i64,
    pub url: String,
    pub timestamp: Option<String>,
    pub failed: bool,
}

/// An ordered concatenation of recordings into a single video (spec §3).
#[derive(Debug, Clone, FromRow)]
pub struct Compilation {
    pub id: i64,
    pub upload_filename: String,
    pub creation_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct RecordingCompilation {
    pub compilation_id: i64,
    pub recording_id: i64,
    pub position: i32,
}
