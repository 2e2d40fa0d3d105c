//! The human side of the Approver loop (spec §4.10): showing the operator
//! the capture and reading back a verdict. Kept behind a collaborator the
//! same way rendering/capture are, since "play a video file and read a
//! keystroke" has no portable pure-Rust shape worth hand-rolling.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use wayreel_store::Verdict;
use wayreel_types::{Recording, Snapshot};

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("playback failed: {0}")]
    Playback(String),
    #[error("no review collaborator configured")]
    NotConfigured,
}

pub type Result<T> = std::result::Result<T, ReviewError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensitivityVerdict {
    MarkSensitive,
    MarkNotSensitive,
    Skip,
}

impl SensitivityVerdict {
    pub fn as_override(self) -> Option<bool> {
        match self {
            SensitivityVerdict::MarkSensitive => Some(true),
            SensitivityVerdict::MarkNotSensitive => Some(false),
            SensitivityVerdict::Skip => None,
        }
    }
}

#[async_trait]
pub trait ReviewCollaborator: Send + Sync {
    /// Show the Snapshot/Recording metadata and play the capture (and
    /// narration, if present).
    async fn present(&self, snapshot: &Snapshot, recording: &Recording) -> Result<()>;

    /// Read back the `y/n/r` verdict and the `y/n/s` sensitivity override.
    async fn read_verdict(&self) -> Result<(Verdict, SensitivityVerdict)>;
}

pub struct NotConfigured;

#[async_trait]
impl ReviewCollaborator for NotConfigured {
    async fn present(&self, _snapshot: &Snapshot, _recording: &Recording) -> Result<()> {
        Err(ReviewError::NotConfigured)
    }
    async fn read_verdict(&self) -> Result<(Verdict, SensitivityVerdict)> {
        Err(ReviewError::NotConfigured)
    }
}

/// Does the capture file this Recording claims exist on disk? A missing
/// file silently converts the review into "record again" (spec §4.10).
pub fn capture_file_present(recording: &Recording) -> bool {
    Path::new(&recording.upload_filename).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn recording_with_file(path: &str) -> Recording {
        Recording {
            id: 1,
            snapshot_id: 1,
            is_processed: false,
            has_audio: false,
            upload_filename: path.to_string(),
            archive_filename: None,
            text_to_speech_filename: None,
            creation_time: Utc::now(),
            publish_time: None,
            twitter_id: None,
            mastodon_id: None,
            tumblr_id: None,
            bluesky_id: None,
        }
    }

    #[test]
    fn missing_file_is_detected() {
        let recording = recording_with_file("/definitely/not/a/real/path.mp4");
        assert!(!capture_file_present(&recording));
    }

    #[test]
    fn sensitivity_verdict_maps_to_override() {
        assert_eq!(SensitivityVerdict::MarkSensitive.as_override(), Some(true));
        assert_eq!(SensitivityVerdict::MarkNotSensitive.as_override(), Some(false));
        assert_eq!(SensitivityVerdict::Skip.as_override(), None);
    }
}
