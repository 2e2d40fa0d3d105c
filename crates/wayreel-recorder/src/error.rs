use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecorderError>;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("store error: {0}")]
    Store(#[from] wayreel_store::StoreError),
    #[error("archive error: {0}")]
    Archive(#[from] wayreel_archive::ArchiveError),
    #[error("proxy bridge error: {0}")]
    Proxy(#[from] wayreel_proxy::ProxyError),
    #[error("capture collaborator failed: {0}")]
    Capture(String),
    #[error("transcode collaborator failed: {0}")]
    Transcode(String),
    #[error("speech collaborator failed: {0}")]
    Speech(String),
    #[error("session-level failure, ending batch: {0}")]
    SessionFailure(String),
}
