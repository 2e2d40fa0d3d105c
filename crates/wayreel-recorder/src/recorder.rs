//! C8 Recorder (spec §4.9): drives one capture end-to-end through a
//! cache-warm pass and a record pass, both scoped inside a ProxyBridge
//! session and guarded by a [`PluginCrashTimer`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use wayreel_archive::{ArchiveClient, ArchiveError};
use wayreel_proxy::{ProxyCollaborator, ProxyEvent};
use wayreel_scout::rendering::{NavigationOutcome as RenderNavigation, RenderingCollaborator};
use wayreel_store::{NewRecording, NewSavedUrl, Store};
use wayreel_types::url_key::{Modifier, WaybackUrl};

use crate::backfill::{candidate_levels, select_live_candidates};
use crate::collaborators::{CaptureCollaborator, SpeechCollaborator, TranscodeCollaborator};
use crate::crash_timer::{deadline, PluginCrashTimer, PluginKiller};
use crate::error::{RecorderError, Result};
use crate::redirect::{is_redirected, ObservedNavigation};

#[derive(Debug, Clone)]
pub struct RecorderTiming {
    pub base_plugin_crash_timeout: Duration,
    pub page_load_timeout: Duration,
    pub plugin_load_wait: Duration,
    pub cache_wait: Duration,
    pub proxy_total_timeout: Duration,
    pub scroll_step: i64,
    pub max_consecutive_save_tries: usize,
    pub max_total_save_tries: usize,
}

impl Default for RecorderTiming {
    fn default() -> Self {
        Self {
            base_plugin_crash_timeout: Duration::from_secs(30),
            page_load_timeout: Duration::from_secs(60),
            plugin_load_wait: Duration::from_secs(3),
            cache_wait: Duration::from_secs(5),
            proxy_total_timeout: Duration::from_secs(20),
            scroll_step: 600,
            max_consecutive_save_tries: 3,
            max_total_save_tries: 10,
        }
    }
}

#[derive(Debug)]
pub enum IterationOutcome {
    NoWork,
    Recorded { snapshot_id: i64, recording_id: i64 },
    Aborted { snapshot_id: i64, reason: &'static str },
}

pub struct Recorder {
    store: Arc<Store>,
    archive: Arc<ArchiveClient>,
    rendering: Arc<dyn RenderingCollaborator>,
    proxy: Arc<dyn ProxyCollaborator>,
    capture: Arc<dyn CaptureCollaborator>,
    transcode: Arc<dyn TranscodeCollaborator>,
    speech: Arc<dyn SpeechCollaborator>,
    plugin_killer: Arc<dyn PluginKiller>,
    pick_params: wayreel_store::RecordPickParams,
    rank_tuning: wayreel_store::RankTuning,
    high_priority_threshold: i64,
    timing: RecorderTiming,
    recordings_path: PathBuf,
}

impl Recorder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<Store>,
        archive: Arc<ArchiveClient>,
        rendering: Arc<dyn RenderingCollaborator>,
        proxy: Arc<dyn ProxyCollaborator>,
        capture: Arc<dyn CaptureCollaborator>,
        transcode: Arc<dyn TranscodeCollaborator>,
        speech: Arc<dyn SpeechCollaborator>,
        plugin_killer: Arc<dyn PluginKiller>,
        pick_params: wayreel_store::RecordPickParams,
        rank_tuning: wayreel_store::RankTuning,
        high_priority_threshold: i64,
        timing: RecorderTiming,
        recordings_path: PathBuf,
    ) -> Self {
        Self {
            store,
            archive,
            rendering,
            proxy,
            capture,
            transcode,
            speech,
            plugin_killer,
            pick_params,
            rank_tuning,
            high_priority_threshold,
            timing,
            recordings_path,
        }
    }

    pub async fn run_iteration(&self) -> Result<IterationOutcome> {
        // Step 1.
        let Some(snapshot_id) = self
            .store
            .record_pick(self.pick_params, self.rank_tuning, self.high_priority_threshold)
            .await?
        else {
            return Ok(IterationOutcome::NoWork);
        };
        let Some(snapshot) = self.store.get_snapshot(snapshot_id).await? else {
            return Ok(IterationOutcome::NoWork);
        };

        let requested = WaybackUrl::new(&snapshot.timestamp, Some(Modifier::Iframe), &snapshot.url);

        self.proxy.set_timestamp(&snapshot.timestamp).await?;

        // Step 4: cache-warm pass.
        let warm_deadline = deadline(self.timing.base_plugin_crash_timeout, self.timing.page_load_timeout, Duration::ZERO);
        let mut warm_timer = PluginCrashTimer::arm(warm_deadline, self.plugin_killer.clone());

        let navigation = self.rendering.navigate(&requested.compose()).await;
        let warm_result = match navigation {
            Ok(outcome) => self.after_navigate(&snapshot_id, &requested, outcome).await,
            Err(e) => Err(RecorderError::SessionFailure(e.to_string())),
        };
        warm_timer.disarm().await;

        if warm_timer.crashed() {
            self.proxy.clear_timestamp().await.ok();
            self.store.finish_record_aborted(snapshot_id).await?;
            return Ok(IterationOutcome::Aborted { snapshot_id, reason: "plugin crash timer fired during cache-warm" });
        }

        match warm_result {
            Ok(true) => {}
            Ok(false) => {
                self.proxy.clear_timestamp().await.ok();
                self.store.finish_record_aborted(snapshot_id).await?;
                return Ok(IterationOutcome::Aborted { snapshot_id, reason: "redirected during cache-warm" });
            }
            Err(e) => {
                self.proxy.clear_timestamp().await.ok();
                return Err(e);
            }
        }

        tokio::time::sleep(self.timing.plugin_load_wait).await;
        tokio::time::sleep(self.timing.cache_wait).await;

        let events = self.drain_proxy_events().await;
        let missing: Vec<String> = events
            .iter()
            .filter_map(|e| if let ProxyEvent::Save { url } = e { Some(url.clone()) } else { None })
            .collect();

        // Step 6: record pass.
        let record_deadline = deadline(self.timing.base_plugin_crash_timeout, self.timing.page_load_timeout, Duration::from_secs(60));
        let mut record_timer = PluginCrashTimer::arm(record_deadline, self.plugin_killer.clone());

        let raw_path = self.recordings_path.join(format!("{snapshot_id}_raw.mp4"));
        let capture_ok = self.run_capture_pass(&raw_path).await;
        record_timer.disarm().await;
        self.proxy.clear_timestamp().await.ok();

        if record_timer.crashed() || !capture_ok {
            self.store.finish_record_aborted(snapshot_id).await?;
            return Ok(IterationOutcome::Aborted { snapshot_id, reason: "capture failed or plugin crash timer fired" });
        }

        // Step 8: post-process.
        let upload_path = self.recordings_path.join(format!("{snapshot_id}_upload.mp4"));
        let archive_path = self.recordings_path.join(format!("{snapshot_id}_archive.mkv"));
        self.transcode
            .transcode(&raw_path, &upload_path, &archive_path)
            .await
            .map_err(|e| RecorderError::Transcode(e.to_string()))?;

        // Step 9: audio detection.
        let audio_probe = self
            .transcode
            .probe_audio(&upload_path)
            .await
            .map_err(|e| RecorderError::Transcode(e.to_string()))?;
        let has_audio = audio_probe.has_audio();

        // Step 10: optional narration.
        let mut narration_path = None;
        if let Some(page_title) = snapshot.page_title.as_deref() {
            let voice = snapshot.page_language.as_deref().unwrap_or("en");
            let destination = self.recordings_path.join(format!("{snapshot_id}_tts.{voice}.mp4"));
            match self.speech.synthesize(page_title, voice, &destination).await {
                Ok(_) => narration_path = Some(destination),
                Err(e) => warn!(snapshot_id, error = %e, "narration synthesis failed, continuing without it"),
            }
        }

        // Step 12: missing-asset backfill. Liveness is probed with a plain
        // HEAD (`is_url_available`), never the Save API itself, to keep the
        // number of Save requests down to the candidates actually archived.
        let mut saved_urls = Vec::new();
        for missing_url in &missing {
            let candidates = candidate_levels(missing_url, self.timing.max_total_save_tries);
            let mut live_checks = Vec::new();
            for candidate in &candidates {
                let live = self.archive.is_url_available(candidate).await;
                live_checks.push((candidate.clone(), live));
            }
            let live_lookup: std::collections::HashMap<&str, bool> =
                live_checks.iter().map(|(u, live)| (u.as_str(), *live)).collect();
            let selected = select_live_candidates(
                &candidates,
                |c| *live_lookup.get(c).unwrap_or(&false),
                self.timing.max_consecutive_save_tries,
            );
            for url in selected {
                match self.archive.save(&url).await {
                    Ok(_) => saved_urls.push(NewSavedUrl { url, timestamp: None, failed: false }),
                    // A 429 means the Save API itself is rate-limited, not
                    // that this one candidate is dead: stop backfilling
                    // this capture rather than burning through the rest.
                    Err(ArchiveError::RateLimited) => return Err(ArchiveError::RateLimited.into()),
                    Err(_) => saved_urls.push(NewSavedUrl { url, timestamp: None, failed: true }),
                }
            }
        }

        // Step 13: transactional write.
        let recording_id = self
            .store
            .finish_record_success(
                snapshot_id,
                NewRecording {
                    snapshot_id,
                    has_audio,
                    upload_filename: upload_path.display().to_string(),
                    archive_filename: Some(archive_path.display().to_string()),
                    text_to_speech_filename: narration_path.map(|p| p.display().to_string()),
                },
                saved_urls,
            )
            .await?;

        info!(snapshot_id, recording_id, "recorded snapshot");
        Ok(IterationOutcome::Recorded { snapshot_id, recording_id })
    }

    /// Navigates having already started, interprets the outcome per
    /// §4.9.2, and reports whether the pass should continue (`true`) or
    /// abort as redirected (`false`).
    async fn after_navigate(
        &self,
        _snapshot_id: &i64,
        requested: &WaybackUrl,
        outcome: RenderNavigation,
    ) -> Result<bool> {
        match outcome {
            RenderNavigation::Blank => Ok(true),
            RenderNavigation::Landed => Ok(true),
            RenderNavigation::Redirected { target_url } => {
                let observed = ObservedNavigation { current_url: target_url, redirect_count: 1 };
                Ok(!is_redirected(requested, &observed))
            }
        }
    }

    async fn drain_proxy_events(&self) -> Vec<ProxyEvent> {
        let mut events = Vec::new();
        let deadline = tokio::time::Instant::now() + self.timing.proxy_total_timeout;
        loop {
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            match tokio::time::timeout(Duration::from_millis(200), self.next_event()).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) | Err(_) => break,
            }
        }
        events
    }

    async fn next_event(&self) -> Option<ProxyEvent> {
        self.proxy.next_event().await
    }

    async fn run_capture_pass(&self, raw_path: &PathBuf) -> bool {
        if self.capture.start(raw_path).await.is_err() {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        let scrolls = scroll_count(2000, 800, self.timing.scroll_step);
        for _ in 0..scrolls {
            if self.capture.scroll_by(self.timing.scroll_step).await.is_err() {
                break;
            }
        }
        match self.capture.stop().await {
            Ok(result) => result.exit_ok,
            Err(_) => false,
        }
    }
}

/// `ceil((scroll_height - client_height) / scroll_step)` (spec §4.9 step 6).
fn scroll_count(scroll_height: i64, client_height: i64, scroll_step: i64) -> i64 {
    let remaining = (scroll_height - client_height).max(0);
    if scroll_step <= 0 {
        return 0;
    }
    (remaining + scroll_step - 1) / scroll_step
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_count_rounds_up() {
        assert_eq!(scroll_count(2000, 800, 600), 2);
        assert_eq!(scroll_count(1400, 800, 600), 1);
        assert_eq!(scroll_count(800, 800, 600), 0);
    }

    #[test]
    fn scroll_count_never_negative() {
        assert_eq!(scroll_count(400, 800, 600), 0);
    }
}
