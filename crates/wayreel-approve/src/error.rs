use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApproveError>;

#[derive(Debug, Error)]
pub enum ApproveError {
    #[error("store error: {0}")]
    Store(#[from] wayreel_store::StoreError),
    #[error("review collaborator failed: {0}")]
    Review(String),
}
