//! The external muxer collaborator (spec §4.12): remux to MPEG-TS to
//! avoid concat DTS issues, generate a matching transition segment,
//! concat via the file-list protocol.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MuxError {
    #[error("mux collaborator failed: {0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, MuxError>;

#[derive(Debug, Clone, Copy)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct TransitionSpec {
    pub color: &'static str,
    pub duration: Duration,
    pub resolution: Resolution,
    pub framerate: u32,
}

#[async_trait]
pub trait MuxCollaborator: Send + Sync {
    async fn remux_to_ts(&self, input: &Path, output: &Path) -> Result<()>;
    async fn generate_transition(&self, spec: &TransitionSpec, sfx: Option<&Path>, output: &Path) -> Result<()>;
    /// Concat via the external muxer's file-list protocol: one line per
    /// segment, in order.
    async fn concat(&self, segments: &[PathBuf], output: &Path) -> Result<()>;
    async fn probe_resolution_and_framerate(&self, input: &Path) -> Result<(Resolution, u32)>;
    async fn probe_duration(&self, input: &Path) -> Result<Duration>;
}

pub struct NotConfigured;

#[async_trait]
impl MuxCollaborator for NotConfigured {
    async fn remux_to_ts(&self, _input: &Path, _output: &Path) -> Result<()> {
        Err(MuxError::Failed("no mux collaborator configured".into()))
    }
    async fn generate_transition(&self, _spec: &TransitionSpec, _sfx: Option<&Path>, _output: &Path) -> Result<()> {
        Err(MuxError::Failed("no mux collaborator configured".into()))
    }
    async fn concat(&self, _segments: &[PathBuf], _output: &Path) -> Result<()> {
        Err(MuxError::Failed("no mux collaborator configured".into()))
    }
    async fn probe_resolution_and_framerate(&self, _input: &Path) -> Result<(Resolution, u32)> {
        Err(MuxError::Failed("no mux collaborator configured".into()))
    }
    async fn probe_duration(&self, _input: &Path) -> Result<Duration> {
        Err(MuxError::Failed("no mux collaborator configured".into()))
    }
}

/// Render the file-list protocol body the external muxer's concat demuxer
/// expects: one `file '<path>'` line per segment, in order.
pub fn file_list_body(segments: &[PathBuf]) -> String {
    segments.iter().map(|p| format!("file '{}'", p.display())).collect::<Vec<_>>().join("\n")
}
