//! Error types for Scopekeep Core

use thiserror::Error;

/// Main error type for Scopekeep operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Grant error: {0}")]
    Grant(#[from] GrantError),

    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors minting a capability token from a freshly picked location
#[derive(Error, Debug)]
pub enum GrantError {
    #[error("Cannot serialize a bookmark for this location: {0}")]
    SerializationFailed(String),
}

/// Errors resolving a stored capability token back into an active session
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Bookmark is stale")]
    Stale,

    #[error("Failed to start security scope for {0}")]
    LockAcquireFailed(String),

    #[error("Bookmark data is corrupt or incompatible: {0}")]
    DeserializeFailed(String),

    #[error("A session is already active")]
    SessionAlreadyActive,
}

/// Token store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection pool error: {0}")]
    Pool(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Store(StoreError::Database(err.to_string()))
    }
}

impl From<r2d2::Error> for Error {
    fn from(err: r2d2::Error) -> Self {
        Error::Store(StoreError::Pool(err.to_string()))
    }
}

impl Error {
    /// Stable channel code for host-facing responses.
    ///
    /// `Stale` and `LockAcquireFailed` are expected, recoverable-by-user
    /// conditions; everything else indicates corruption or an environment
    /// failure the host should treat as an anomaly.
    pub fn channel_code(&self) -> &'static str {
        match self {
            Error::Grant(GrantError::SerializationFailed(_)) => "BOOKMARK_ERROR",
            Error::Resolve(ResolveError::Stale) => "BOOKMARK_STALE",
            Error::Resolve(ResolveError::LockAcquireFailed(_)) => "START_ACCESS_FAIL",
            Error::Resolve(ResolveError::DeserializeFailed(_)) => "RESTORE_ERROR",
            Error::Resolve(ResolveError::SessionAlreadyActive) => "RESTORE_ERROR",
            Error::Store(_) => "STORE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_codes() {
        let err = Error::Resolve(ResolveError::Stale);
        assert_eq!(err.channel_code(), "BOOKMARK_STALE");

        let err = Error::Resolve(ResolveError::LockAcquireFailed("/x".into()));
        assert_eq!(err.channel_code(), "START_ACCESS_FAIL");

        let err = Error::Grant(GrantError::SerializationFailed("nope".into()));
        assert_eq!(err.channel_code(), "BOOKMARK_ERROR");

        let err = Error::Resolve(ResolveError::SessionAlreadyActive);
        assert_eq!(err.channel_code(), "RESTORE_ERROR");
    }
}
