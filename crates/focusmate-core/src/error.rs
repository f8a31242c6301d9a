//! Core error types for focusmate-core.
//!
//! Playback and notification errors exist so the audio player and gateway
//! can log what went wrong; they are never propagated past those components.

use std::path::PathBuf;
use thiserror::Error;

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked by another process
    #[error("Store is locked")]
    Locked,

    /// Value could not be encoded for storage
    #[error("Failed to encode value for '{key}': {message}")]
    Encode { key: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// A track catalog has no entries
    #[error("Track catalog '{0}' is empty")]
    EmptyCatalog(&'static str),
}

/// Audio playback errors.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The configured player command is empty
    #[error("No player command configured")]
    NoPlayer,

    /// Nothing is loaded into the channel, or the cue file is missing
    #[error("No playable source: {0}")]
    NoSource(String),

    /// The player process could not be spawned
    #[error("Failed to spawn player '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Notification errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// No notification service on this host
    #[error("Notifications are unavailable on this platform")]
    Unavailable,

    /// The platform refused to show the notification
    #[error("Notification failed: {0}")]
    Platform(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_name_the_offending_key() {
        let err = ConfigError::InvalidValue {
            key: "timer.focus_secs".into(),
            message: "must be greater than zero".into(),
        };
        assert!(err.to_string().contains("timer.focus_secs"));
        assert_eq!(
            ConfigError::EmptyCatalog("focus").to_string(),
            "Track catalog 'focus' is empty"
        );
    }

    #[test]
    fn non_sqlite_failure_maps_to_query_failed() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::QueryFailed(_)));
    }
}
