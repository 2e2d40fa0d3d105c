//! The headless-browser collaborator Scout drives (spec §4.8). Kept to
//! the handful of operations the iteration actually performs, the same
//! way `ContentFetcher` narrows `Archive` down to what `ScrapePhase`
//! needs.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderingError {
    #[error("webdriver error: {0}")]
    WebDriver(String),
    #[error("webdriver session failed: {0}")]
    SessionFailed(String),
}

pub type Result<T> = std::result::Result<T, RenderingError>;

/// Outcome of navigating to a snapshot's wayback URL.
#[derive(Debug, Clone)]
pub enum NavigationOutcome {
    /// Landed on the requested snapshot.
    Landed,
    /// The archive redirected to a different snapshot URL.
    Redirected { target_url: String },
    /// Navigation left the browser on a blank page — usually means the
    /// snapshot is actually a media blob, not a page (spec §4.8 step 4).
    Blank,
}

/// One frame of a rendered page: the frame's extracted outbound links and
/// its visible text, gathered the way Scout needs them (step 5/6/7).
#[derive(Debug, Clone, Default)]
pub struct FrameContent {
    pub hrefs: Vec<String>,
    pub query_string_urls: Vec<String>,
    pub text: String,
    pub uses_plugins: bool,
}

#[async_trait]
pub trait RenderingCollaborator: Send + Sync {
    async fn navigate(&self, wayback_url: &str) -> Result<NavigationOutcome>;

    /// Every frame of the currently-loaded page, in document order.
    async fn frames(&self) -> Result<Vec<FrameContent>>;

    async fn page_title(&self) -> Result<Option<String>>;
}

/// Stand-in for tests and deployments with no browser wired up.
pub struct NotConfigured;

#[async_trait]
impl RenderingCollaborator for NotConfigured {
    async fn navigate(&self, _wayback_url: &str) -> Result<NavigationOutcome> {
        Err(RenderingError::SessionFailed("no rendering collaborator configured".into()))
    }

    async fn frames(&self) -> Result<Vec<FrameContent>> {
        Err(RenderingError::SessionFailed("no rendering collaborator configured".into()))
    }

    async fn page_title(&self) -> Result<Option<String>> {
        Ok(None)
    }
}
