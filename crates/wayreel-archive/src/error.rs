use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive rate-limited the request")]
    RateLimited,

    #[error("no capture found for {0}")]
    NotFound(String),

    #[error("request to archive failed: {0}")]
    Request(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for ArchiveError {
    fn from(e: reqwest::Error) -> Self {
        ArchiveError::Request(e.to_string())
    }
}
