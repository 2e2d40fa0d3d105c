//! Per-worker config sections deserialized from the top-level JSON document
//! (spec §6's "single JSON document with one top-level object per worker
//! name"). Every field carries a default so a missing section still
//! deserializes (`wayreel_common::Config::section`'s contract).

use serde::Deserialize;

use crate::scheduler::ScheduleConfig;

fn default_scheduler() -> String {
    "0 */15 * * * *".to_string()
}

fn default_max_iterations_per_wake() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSchedule {
    #[serde(default = "default_scheduler")]
    pub scheduler: String,
    #[serde(default = "default_max_iterations_per_wake")]
    pub max_iterations_per_wake: usize,
}

impl Default for WorkerSchedule {
    fn default() -> Self {
        Self { scheduler: default_scheduler(), max_iterations_per_wake: default_max_iterations_per_wake() }
    }
}

impl From<WorkerSchedule> for ScheduleConfig {
    fn from(w: WorkerSchedule) -> Self {
        ScheduleConfig { cron_expr: w.scheduler, max_iterations_per_wake: w.max_iterations_per_wake }
    }
}

fn default_archive_host() -> String {
    "web.archive.org".to_string()
}

fn default_max_depth() -> i64 {
    5
}

fn default_max_required_depth() -> i64 {
    3
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoutConfig {
    #[serde(default)]
    pub schedule: WorkerSchedule,
    #[serde(default = "default_archive_host")]
    pub archive_host: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: i64,
    #[serde(default)]
    pub min_year: Option<i32>,
    #[serde(default)]
    pub max_year: Option<i32>,
    #[serde(default = "default_max_required_depth")]
    pub max_required_depth: i64,
    #[serde(default)]
    pub vocabulary: Vec<WordConfig>,
    #[serde(default)]
    pub tokenize_japanese_text: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordConfig {
    pub word: String,
    #[serde(default)]
    pub is_tag: bool,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub is_sensitive: bool,
}

impl From<&WordConfig> for wayreel_types::Word {
    fn from(w: &WordConfig) -> Self {
        wayreel_types::Word {
            id: 0,
            word: w.word.clone(),
            is_tag: w.is_tag,
            points: w.points,
            is_sensitive: w.is_sensitive,
        }
    }
}

fn default_min_publish_days() -> i64 {
    90
}

fn default_min_recordings_for_host() -> i64 {
    3
}

fn default_high_priority_threshold() -> i64 {
    wayreel_types::priority::bucket(wayreel_types::priority::PUBLISH)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordConfig {
    #[serde(default)]
    pub schedule: WorkerSchedule,
    #[serde(default = "default_min_publish_days")]
    pub min_publish_days_for_same_url: i64,
    #[serde(default = "default_min_recordings_for_host")]
    pub min_recordings_for_same_host: i64,
    #[serde(default = "default_high_priority_threshold")]
    pub high_priority_threshold: i64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApproveConfig {
    #[serde(default)]
    pub schedule: WorkerSchedule,
}

fn default_title_budget() -> usize {
    200
}

fn default_require_approval() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    #[serde(default)]
    pub schedule: WorkerSchedule,
    #[serde(default = "default_require_approval")]
    pub require_approval: bool,
    #[serde(default = "default_title_budget")]
    pub title_budget: usize,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            schedule: WorkerSchedule::default(),
            min_publish_days_for_same_url: default_min_publish_days(),
            min_recordings_for_same_host: default_min_recordings_for_host(),
            high_priority_threshold: default_high_priority_threshold(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            schedule: WorkerSchedule::default(),
            require_approval: default_require_approval(),
            title_budget: default_title_budget(),
        }
    }
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            schedule: WorkerSchedule::default(),
            archive_host: default_archive_host(),
            max_depth: default_max_depth(),
            min_year: None,
            max_year: None,
            max_required_depth: default_max_required_depth(),
            vocabulary: Vec::new(),
            tokenize_japanese_text: false,
        }
    }
}
