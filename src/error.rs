use thiserror::Error;

use crate::timer::Status;

/// Failures of the persisted session journal and its key-value medium.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The medium refused the write (quota exceeded, locked, unavailable).
    #[error("storage failure: {0}")]
    StorageFailure(String),

    /// The stored blob could not be decoded.
    #[error("stored sessions are unreadable: {0}")]
    DeserializationFailure(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::StorageFailure(msg.into())
    }

    pub fn deserialization<S: Into<String>>(msg: S) -> Self {
        Self::DeserializationFailure(msg.into())
    }

    /// True for anything that means "the write did not land".
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::StorageFailure(_) | Self::Sqlite(_) | Self::Io(_))
    }
}

/// Rejected timer operations. Benign repeats (double start, double pause)
/// are not errors and never show up here.
#[derive(Error, Debug)]
pub enum TimerError {
    #[error("cannot {action} while {status}")]
    InvalidTransition { action: &'static str, status: Status },

    #[error("no annotation at index {index} (have {len})")]
    OutOfRangeIndex { index: usize, len: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type TimerResult<T> = std::result::Result<T, TimerError>;
