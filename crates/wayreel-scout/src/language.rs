//! Page-language detection (spec §4.8 step 8): an external text classifier,
//! kept behind a seam the same way the rendering collaborator is — a
//! failed or unconfigured detector just means `page_language` stays unset,
//! it never blocks the rest of the iteration.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("{0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, LanguageError>;

#[async_trait]
pub trait LanguageCollaborator: Send + Sync {
    /// Best-guess language code for `page_text` (e.g. `"en"`, `"ja"`), or
    /// `None` if the detector has no confident prediction.
    async fn detect(&self, page_text: &str) -> Result<Option<String>>;
}

/// Stand-in for deployments with no classifier model wired up.
pub struct NotConfigured;

#[async_trait]
impl LanguageCollaborator for NotConfigured {
    async fn detect(&self, _page_text: &str) -> Result<Option<String>> {
        Err(LanguageError::Failed("no language collaborator configured".into()))
    }
}
