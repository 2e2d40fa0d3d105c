//! A social-network publishing target (spec §4.11/§9: Tumblr and Bluesky
//! have columns but no implemented publishing branch in the source — the
//! trait covers all four so adding them later is a `SocialBackend` impl,
//! not a core change; only Twitter/Mastodon ship real implementations).

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use wayreel_store::Backend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("network error posting to {backend}: {source}")]
    Network { backend: &'static str, #[source] source: anyhow::Error },
    #[error("{backend} rejected the post: {reason}")]
    Rejected { backend: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, BackendError>;

#[derive(Debug, Clone)]
pub struct PostResult {
    pub external_id: String,
}

#[async_trait]
pub trait SocialBackend: Send + Sync {
    fn backend(&self) -> Backend;
    fn name(&self) -> &'static str;
    /// Maximum video size this backend accepts, in bytes.
    fn size_cap_bytes(&self) -> u64;
    /// Maximum single-clip length this backend accepts, in seconds —
    /// narration that exceeds it gets split into segments (spec §4.11).
    fn video_length_cap_seconds(&self) -> u64;

    async fn post(&self, body: &str, video_path: &Path) -> Result<PostResult>;
    async fn reply_with_clip(&self, in_reply_to: &str, video_path: &Path) -> Result<PostResult>;
}

pub struct NotConfigured(pub Backend);

#[async_trait]
impl SocialBackend for NotConfigured {
    fn backend(&self) -> Backend {
        self.0
    }
    fn name(&self) -> &'static str {
        "not-configured"
    }
    fn size_cap_bytes(&self) -> u64 {
        0
    }
    fn video_length_cap_seconds(&self) -> u64 {
        0
    }
    async fn post(&self, _body: &str, _video_path: &Path) -> Result<PostResult> {
        Err(BackendError::Rejected { backend: "not-configured", reason: "no backend configured".to_string() })
    }
    async fn reply_with_clip(&self, _in_reply_to: &str, _video_path: &Path) -> Result<PostResult> {
        Err(BackendError::Rejected { backend: "not-configured", reason: "no backend configured".to_string() })
    }
}

/// Split a total duration into N-second segment boundaries, for the
/// narration-reply-split step (spec §4.11).
pub fn segment_boundaries(total_seconds: u64, segment_seconds: u64) -> Vec<(u64, u64)> {
    if segment_seconds == 0 || total_seconds == 0 {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut start = 0;
    while start < total_seconds {
        let end = (start + segment_seconds).min(total_seconds);
        out.push((start, end));
        start = end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_split_evenly() {
        assert_eq!(segment_boundaries(150, 60), vec![(0, 60), (60, 120), (120, 150)]);
    }

    #[test]
    fn short_clip_under_cap_is_one_segment() {
        assert_eq!(segment_boundaries(30, 60), vec![(0, 30)]);
    }

    #[test]
    fn zero_total_is_no_segments() {
        assert!(segment_boundaries(0, 60).is_empty());
    }
}
