use thiserror::Error;

/// Errors that can occur in keeperstate-core.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("partition must be non-negative, got {0}")]
    NegativePartition(i32),

    #[error("unknown state '{0}'")]
    UnknownState(String),

    #[error("invalid state tag '{0}': expected letters, digits or '_'")]
    InvalidTag(String),

    #[error("invalid checkpoint key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, Error>;
