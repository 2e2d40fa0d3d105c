//! Narrow seams around the parts of a capture pass that only exist as an
//! external process on the source platform: the screen-capture tool, the
//! transcoder, and the speech synthesizer. Grounded the same way
//! `PageScraper`/`ContentFetcher` narrow the teacher's fetchers down to
//! exactly what the orchestration calls.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, CollaboratorError>;

/// Screen-capture: start/stop recording the rendering collaborator's
/// viewport to a raw file.
#[async_trait]
pub trait CaptureCollaborator: Send + Sync {
    async fn start(&self, destination: &PathBuf) -> Result<()>;
    async fn stop(&self) -> Result<CaptureResult>;
    /// Smooth-scroll the page by `pixels`, used by the record pass's
    /// `ceil((scroll_height - client_height) / scroll_step)` loop.
    async fn scroll_by(&self, pixels: i64) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub exit_ok: bool,
    pub raw_path: PathBuf,
}

pub struct NotConfiguredCapture;

#[async_trait]
impl CaptureCollaborator for NotConfiguredCapture {
    async fn start(&self, _destination: &PathBuf) -> Result<()> {
        Err(CollaboratorError::Failed("no capture collaborator configured".into()))
    }
    async fn stop(&self) -> Result<CaptureResult> {
        Err(CollaboratorError::Failed("no capture collaborator configured".into()))
    }
    async fn scroll_by(&self, _pixels: i64) -> Result<()> {
        Err(CollaboratorError::Failed("no capture collaborator configured".into()))
    }
}

/// Post-processing: remux/transcode the raw capture into upload-ready and
/// archive-grade variants, and the probes the recorder needs to size a
/// capture pass and detect audio.
#[async_trait]
pub trait TranscodeCollaborator: Send + Sync {
    async fn transcode(&self, raw: &PathBuf, upload_path: &PathBuf, archive_path: &PathBuf) -> Result<()>;
    /// `(total_duration, silence_duration, has_audio_stream)`.
    async fn probe_audio(&self, media: &PathBuf) -> Result<AudioProbe>;
    async fn probe_media(&self, media: &PathBuf) -> Result<MediaProbe>;
}

#[derive(Debug, Clone, Copy)]
pub struct AudioProbe {
    pub total_duration: Duration,
    pub silence_duration: Duration,
    pub has_audio_stream: bool,
}

impl AudioProbe {
    /// Step 9: audible when non-silent time exceeds 200ms, or an audio
    /// stream exists at all even if it measured as entirely silent.
    pub fn has_audio(&self) -> bool {
        let audible = self.total_duration.saturating_sub(self.silence_duration);
        audible > Duration::from_millis(200) || self.has_audio_stream
    }
}

#[derive(Debug, Clone, Default)]
pub struct MediaProbe {
    pub duration: Option<Duration>,
    pub title: Option<String>,
    pub author: Option<String>,
}

pub struct NotConfiguredTranscode;

#[async_trait]
impl TranscodeCollaborator for NotConfiguredTranscode {
    async fn transcode(&self, _raw: &PathBuf, _upload_path: &PathBuf, _archive_path: &PathBuf) -> Result<()> {
        Err(CollaboratorError::Failed("no transcode collaborator configured".into()))
    }
    async fn probe_audio(&self, _media: &PathBuf) -> Result<AudioProbe> {
        Err(CollaboratorError::Failed("no transcode collaborator configured".into()))
    }
    async fn probe_media(&self, _media: &PathBuf) -> Result<MediaProbe> {
        Err(CollaboratorError::Failed("no transcode collaborator configured".into()))
    }
}

/// Speech synthesis for the optional narration pass (step 10).
#[async_trait]
pub trait SpeechCollaborator: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str, destination: &PathBuf) -> Result<Duration>;
}

pub struct NotConfiguredSpeech;

#[async_trait]
impl SpeechCollaborator for NotConfiguredSpeech {
    async fn synthesize(&self, _text: &str, _voice: &str, _destination: &PathBuf) -> Result<Duration> {
        Err(CollaboratorError::Failed("no speech collaborator configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_probe_detects_audible_content() {
        let probe = AudioProbe {
            total_duration: Duration::from_secs(10),
            silence_duration: Duration::from_secs(9),
            has_audio_stream: false,
        };
        assert!(probe.has_audio());
    }

    #[test]
    fn audio_probe_silent_with_no_stream_is_not_audible() {
        let probe = AudioProbe {
            total_duration: Duration::from_secs(10),
            silence_duration: Duration::from_secs(10),
            has_audio_stream: false,
        };
        assert!(!probe.has_audio());
    }

    #[test]
    fn audio_probe_silent_but_stream_present_is_audible() {
        let probe = AudioProbe {
            total_duration: Duration::from_secs(10),
            silence_duration: Duration::from_secs(10),
            has_audio_stream: true,
        };
        assert!(probe.has_audio());
    }
}
