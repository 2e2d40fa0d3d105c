use thiserror::Error;

/// The top-level error taxonomy (spec §7). Each worker's iteration loop
/// matches on these variants to decide whether to retry, sleep-and-continue,
/// or end the batch — never to swallow the error silently.
#[derive(Error, Debug)]
pub enum WayreelError {
    #[error("transient network error talking to {service}: {source}")]
    TransientNetwork {
        service: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("rate-limited by {service}")]
    RateLimited { service: &'static str },

    #[error("database error: {0}")]
    Database(String),

    #[error("session-level failure, ending batch: {0}")]
    SessionFailure(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, WayreelError>;
