//! C10 Publisher (spec §4.11): a cron-scheduled batch of N publications.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use wayreel_store::{PublishPickParams, Store};

use crate::backend::{segment_boundaries, SocialBackend};
use crate::body::status_body;
use crate::media::MediaCollaborator;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("store error: {0}")]
    Store(#[from] wayreel_store::StoreError),
}

pub type Result<T> = std::result::Result<T, PublishError>;

#[derive(Debug)]
pub enum IterationOutcome {
    NoWork,
    Published { snapshot_id: i64, recording_id: i64, backends_posted: usize },
    SkippedAllBackends { snapshot_id: i64 },
}

pub struct Publisher {
    store: Arc<Store>,
    backends: Vec<Arc<dyn SocialBackend>>,
    media: Arc<dyn MediaCollaborator>,
    pick_params: PublishPickParams,
    title_budget: usize,
}

impl Publisher {
    pub fn new(
        store: Arc<Store>,
        backends: Vec<Arc<dyn SocialBackend>>,
        media: Arc<dyn MediaCollaborator>,
        pick_params: PublishPickParams,
        title_budget: usize,
    ) -> Self {
        Self { store, backends, media, pick_params, title_budget }
    }

    /// Run up to `max_iterations` publications; a per-publication network
    /// error never fails the batch (spec §4.11).
    pub async fn run_batch(&self, max_iterations: usize) -> Result<Vec<IterationOutcome>> {
        let mut outcomes = Vec::with_capacity(max_iterations);
        for _ in 0..max_iterations {
            let outcome = self.run_iteration().await?;
            let is_no_work = matches!(outcome, IterationOutcome::NoWork);
            outcomes.push(outcome);
            if is_no_work {
                break;
            }
        }
        Ok(outcomes)
    }

    pub async fn run_iteration(&self) -> Result<IterationOutcome> {
        let Some((snapshot_id, recording_id)) = self.store.publish_pick(self.pick_params).await? else {
            return Ok(IterationOutcome::NoWork);
        };
        let Some(snapshot) = self.store.get_snapshot(snapshot_id).await? else {
            return Ok(IterationOutcome::NoWork);
        };
        let Some(recording) = self.store.find_recording(recording_id).await? else {
            return Ok(IterationOutcome::NoWork);
        };

        let body = status_body(&snapshot, self.title_budget, None);
        let video_path = Path::new(&recording.upload_filename);
        let video_size = std::fs::metadata(video_path).map(|m| m.len()).unwrap_or(0);

        let mut posted = 0usize;
        for backend in &self.backends {
            if video_size > backend.size_cap_bytes() {
                warn!(snapshot_id, backend = backend.name(), video_size, "skipping backend, video exceeds size cap");
                continue;
            }
            match backend.post(&body, video_path).await {
                Ok(result) => {
                    self.store.record_publish_result(recording_id, backend.backend(), &result.external_id).await?;
                    posted += 1;
                    if let Some(tts_filename) = &recording.text_to_speech_filename {
                        self.reply_with_narration(backend, &result.external_id, Path::new(tts_filename)).await;
                    }
                }
                Err(e) => {
                    warn!(snapshot_id, backend = backend.name(), error = %e, "publication failed, continuing batch");
                }
            }
        }

        if posted == 0 {
            return Ok(IterationOutcome::SkippedAllBackends { snapshot_id });
        }

        self.store.finish_publish(snapshot_id, recording_id).await?;
        info!(snapshot_id, recording_id, backends_posted = posted, "published recording");
        Ok(IterationOutcome::Published { snapshot_id, recording_id, backends_posted: posted })
    }

    /// Reply to a just-posted status with the narration track, splitting it
    /// into `video_length_cap_seconds`-sized segments chained as successive
    /// replies when it's too long for a single clip (spec §4.11). Failures
    /// here never fail the publication — the main post already succeeded.
    async fn reply_with_narration(&self, backend: &Arc<dyn SocialBackend>, in_reply_to: &str, tts_path: &Path) {
        let cap = backend.video_length_cap_seconds();
        if cap == 0 {
            return;
        }
        let total = match self.media.probe_duration_seconds(tts_path).await {
            Ok(duration) => duration,
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "narration duration probe failed, skipping reply");
                return;
            }
        };
        if total == 0 {
            return;
        }
        if total <= cap {
            if let Err(e) = backend.reply_with_clip(in_reply_to, tts_path).await {
                warn!(backend = backend.name(), error = %e, "narration reply failed");
            }
            return;
        }

        let mut last_reply_to = in_reply_to.to_string();
        for (start, end) in segment_boundaries(total, cap) {
            let segment_path = match self.media.extract_segment(tts_path, start, end).await {
                Ok(path) => path,
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "narration segment extraction failed, stopping reply thread");
                    break;
                }
            };
            match backend.reply_with_clip(&last_reply_to, &segment_path).await {
                Ok(result) => last_reply_to = result.external_id,
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "narration segment reply failed, stopping reply thread");
                    break;
                }
            }
        }
    }
}
