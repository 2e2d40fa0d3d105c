//! Narrow seam around the external muxer used to physically split a
//! narration file into reply-sized segments (spec §4.11): the same kind of
//! process-backed collaborator as the recorder's `TranscodeCollaborator`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, MediaError>;

#[async_trait]
pub trait MediaCollaborator: Send + Sync {
    async fn probe_duration_seconds(&self, path: &Path) -> Result<u64>;
    /// Extract the `[start, end)` second range of `path` into a new file.
    async fn extract_segment(&self, path: &Path, start: u64, end: u64) -> Result<PathBuf>;
}

pub struct NotConfigured;

#[async_trait]
impl MediaCollaborator for NotConfigured {
    async fn probe_duration_seconds(&self, _path: &Path) -> Result<u64> {
        Err(MediaError::Failed("no media collaborator configured".into()))
    }
    async fn extract_segment(&self, _path: &Path, _start: u64, _end: u64) -> Result<PathBuf> {
        Err(MediaError::Failed("no media collaborator configured".into()))
    }
}
