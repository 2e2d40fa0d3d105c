use thiserror::Error;

#[derive(Error, Debug)]
pub enum TypesError {
    #[error("unknown snapshot state value: {0}")]
    UnknownState(i64),

    #[error("malformed timestamp {0:?}: expected 14-digit YYYYMMDDHHMMSS")]
    MalformedTimestamp(String),

    #[error("unknown option key {0:?} is not in MUTABLE_OPTIONS")]
    UnknownOption(String),

    #[error("invalid option value for {key}: {reason}")]
    InvalidOptionValue { key: String, reason: String },
}
