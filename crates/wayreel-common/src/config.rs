//! Configuration loading (spec §6): a single JSON document with one
//! top-level object per worker name, plus secrets layered in from the
//! environment. Each worker pulls only the slice it needs, the way
//! `rootsignal_common::Config` exposes `scout_from_env`/`editions_from_env`/…
//! constructors that each populate a different subset of fields.

use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, WayreelError};

/// The root configuration document. Top-level JSON keys are worker names
/// (`scout`, `record`, `approve`, `publish`, `compile`) plus a few
/// pipeline-wide paths.
#[derive(Debug, Clone)]
pub struct Config {
    document: Value,
    pub database_path: PathBuf,
    pub recordings_path: PathBuf,
    pub compilations_path: PathBuf,
}

impl Config {
    /// Load the JSON config document from `path`, reading
    /// `database_path`/`recordings_path`/`compilations_path` from its root.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| WayreelError::Config(format!("reading {:?}: {e}", path.as_ref())))?;
        let document: Value = serde_json::from_str(&text)
            .map_err(|e| WayreelError::Config(format!("parsing {:?}: {e}", path.as_ref())))?;
        Self::from_document(document)
    }

    pub fn from_document(document: Value) -> Result<Self> {
        let database_path = required_path(&document, "database_path")?;
        let recordings_path = required_path(&document, "recordings_path")?;
        let compilations_path = required_path(&document, "compilations_path")?;
        Ok(Self {
            document,
            database_path,
            recordings_path,
            compilations_path,
        })
    }

    /// Deserialize the named top-level section (`"scout"`, `"record"`, …)
    /// into a worker-specific config type. Missing sections deserialize from
    /// an empty object, so every field in `T` must have a `#[serde(default)]`
    /// or be `Option`.
    pub fn section<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let section = self.document.get(name).cloned().unwrap_or(Value::Object(Default::default()));
        serde_json::from_value(section)
            .map_err(|e| WayreelError::Config(format!("section {name:?}: {e}")))
    }

    pub fn document(&self) -> &Value {
        &self.document
    }
}

fn required_path(document: &Value, key: &str) -> Result<PathBuf> {
    document
        .get(key)
        .and_then(Value::as_str)
        .map(PathBuf::from)
        .ok_or_else(|| WayreelError::Config(format!("missing required top-level key {key:?}")))
}

/// Read a required environment variable, following the same fail-fast shape
/// as `rootsignal_common::config::required_env`.
pub fn required_env(key: &str) -> Result<String> {
    env::var(key).map_err(|_| WayreelError::Config(format!("{key} environment variable is required")))
}

pub fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Social publishing credentials, layered from the environment on top of
/// the JSON document (spec §6's "Social-network client libraries" are
/// external, but which backends are *enabled* is ambient config).
#[derive(Debug, Clone, Default)]
pub struct SocialCredentials {
    pub enabled_backends: BTreeSet<String>,
    pub twitter_bearer_token: Option<String>,
    pub mastodon_access_token: Option<String>,
    pub tumblr_oauth_token: Option<String>,
    pub bluesky_app_password: Option<String>,
}

impl SocialCredentials {
    pub fn from_env(enabled_backends: impl IntoIterator<Item = String>) -> Self {
        Self {
            enabled_backends: enabled_backends.into_iter().collect(),
            twitter_bearer_token: optional_env("WAYREEL_TWITTER_BEARER_TOKEN"),
            mastodon_access_token: optional_env("WAYREEL_MASTODON_ACCESS_TOKEN"),
            tumblr_oauth_token: optional_env("WAYREEL_TUMBLR_OAUTH_TOKEN"),
            bluesky_app_password: optional_env("WAYREEL_BLUESKY_APP_PASSWORD"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, Default, PartialEq)]
    struct ScoutSection {
        #[serde(default)]
        max_depth: Option<i32>,
    }

    #[test]
    fn section_deserializes_named_object() {
        let cfg = Config::from_document(json!({
            "database_path": "db.sqlite",
            "recordings_path": "recordings",
            "compilations_path": "compilations",
            "scout": {"max_depth": 5}
        }))
        .unwrap();
        let scout: ScoutSection = cfg.section("scout").unwrap();
        assert_eq!(scout.max_depth, Some(5));
    }

    #[test]
    fn missing_section_deserializes_as_default() {
        let cfg = Config::from_document(json!({
            "database_path": "db.sqlite",
            "recordings_path": "recordings",
            "compilations_path": "compilations"
        }))
        .unwrap();
        let scout: ScoutSection = cfg.section("scout").unwrap();
        assert_eq!(scout, ScoutSection::default());
    }

    #[test]
    fn missing_required_path_is_an_error() {
        let err = Config::from_document(json!({"database_path": "db.sqlite"})).unwrap_err();
        assert!(matches!(err, WayreelError::Config(_)));
    }
}
