//! C11 Compiler (spec §4.12): select recordings by date window or ID
//! list, remux and concatenate them with a transition, write the sidecar.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use wayreel_store::Store;

use crate::idlist::{parse_id_list, IdListError};
use crate::mux::{MuxCollaborator, TransitionSpec};
use crate::sidecar::{render_sidecar, SidecarEntry};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("store error: {0}")]
    Store(#[from] wayreel_store::StoreError),
    #[error("mux collaborator failed: {0}")]
    Mux(#[from] crate::mux::MuxError),
    #[error("invalid id list: {0}")]
    IdList(#[from] IdListError),
    #[error("no recordings selected")]
    Empty,
}

pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Debug, Clone, Copy)]
pub enum IdListMode {
    Snapshot,
    Recording,
}

pub enum Selection {
    PublishWindow { begin: DateTime<Utc>, end: DateTime<Utc> },
    IdList { mode: IdListMode, spec: String },
}

#[derive(Debug, Clone)]
pub struct TransitionOptions {
    pub color: &'static str,
    pub duration: Duration,
    pub sfx: Option<PathBuf>,
}

pub struct Compiler {
    store: Arc<Store>,
    mux: Arc<dyn MuxCollaborator>,
    compilations_path: PathBuf,
}

impl Compiler {
    pub fn new(store: Arc<Store>, mux: Arc<dyn MuxCollaborator>, compilations_path: PathBuf) -> Self {
        Self { store, mux, compilations_path }
    }

    async fn select_recordings(&self, selection: &Selection) -> Result<Vec<wayreel_types::Recording>> {
        match selection {
            Selection::PublishWindow { begin, end } => {
                Ok(self.store.recordings_published_between(*begin, *end).await?)
            }
            Selection::IdList { mode, spec } => {
                let ids = parse_id_list(spec)?;
                let mut recordings = Vec::new();
                for id in ids {
                    let recording = match mode {
                        IdListMode::Recording => self.store.find_recording(id).await?,
                        IdListMode::Snapshot => self.store.latest_recording_for_snapshot(id).await?,
                    };
                    if let Some(recording) = recording {
                        recordings.push(recording);
                    }
                }
                Ok(recordings)
            }
        }
    }

    /// `include_narration` concatenates each recording's text-to-speech
    /// sidecar (when one exists) as its own segment immediately before the
    /// recording it narrates, reusing `remux_to_ts`/`concat` rather than
    /// asking the mux collaborator for an audio-overlay primitive it
    /// doesn't otherwise need.
    pub async fn compile(
        &self,
        selection: Selection,
        transition: TransitionOptions,
        include_narration: bool,
        compilation_name: &str,
    ) -> Result<PathBuf> {
        let recordings = self.select_recordings(&selection).await?;
        if recordings.is_empty() {
            return Err(CompileError::Empty);
        }

        let first_path = Path::new(&recordings[0].upload_filename);
        let (resolution, framerate) = self.mux.probe_resolution_and_framerate(first_path).await?;

        let transition_ts = self.compilations_path.join(format!("{compilation_name}_transition.ts"));
        let spec = TransitionSpec { color: transition.color, duration: transition.duration, resolution, framerate };
        self.mux.generate_transition(&spec, transition.sfx.as_deref(), &transition_ts).await?;

        let mut segments = Vec::new();
        let mut sidecar_entries = Vec::new();
        let mut offset = Duration::ZERO;

        for (i, recording) in recordings.iter().enumerate() {
            if include_narration {
                if let Some(tts_filename) = &recording.text_to_speech_filename {
                    let tts_path = Path::new(tts_filename);
                    let tts_ts = self.compilations_path.join(format!("{compilation_name}_{}_tts.ts", recording.id));
                    self.mux.remux_to_ts(tts_path, &tts_ts).await?;
                    let tts_duration = self.mux.probe_duration(tts_path).await?;
                    segments.push(tts_ts);
                    offset += tts_duration;
                }
            }

            let raw_path = Path::new(&recording.upload_filename);
            let ts_path = self.compilations_path.join(format!("{compilation_name}_{}.ts", recording.id));
            self.mux.remux_to_ts(raw_path, &ts_path).await?;
            let recording_duration = self.mux.probe_duration(raw_path).await?;
            segments.push(ts_path);

            sidecar_entries.push(SidecarEntry {
                start_offset: offset,
                title: format!("recording {}", recording.id),
                metadata: None,
                date: recording.creation_time.format("%Y-%m-%d").to_string(),
                emojis: if recording.has_audio { Some("\u{1F50A}".to_string()) } else { None },
            });
            offset += recording_duration;

            if i + 1 < recordings.len() {
                segments.push(transition_ts.clone());
                offset += transition.duration;
            }
        }

        let output = self.compilations_path.join(format!("{compilation_name}.mp4"));
        self.mux.concat(&segments, &output).await?;

        let summary = format!("{} recordings compiled", recordings.len());
        let sidecar_text = render_sidecar(&sidecar_entries, &summary);
        let sidecar_path = self.compilations_path.join(format!("{compilation_name}.txt"));
        std::fs::write(&sidecar_path, sidecar_text).map_err(|e| {
            CompileError::Mux(crate::mux::MuxError::Failed(format!("writing sidecar: {e}")))
        })?;

        let recording_ids: Vec<i64> = recordings.iter().map(|r| r.id).collect();
        self.store.insert_compilation(&output.display().to_string(), &recording_ids).await?;

        Ok(output)
    }
}
