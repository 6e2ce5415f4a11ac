//! Error types for the store and the login gate.
//!
//! Failed writes are errors, and so is an unreadable file on a write path. A
//! missing or corrupted store file is reported through
//! [`crate::store::Loaded`] instead.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to write or remove a store file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("refusing to overwrite unreadable store file {path}: {detail}")]
    Unreadable { path: PathBuf, detail: String },

    #[error("failed to create store directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write store file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove store file {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize messages for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Rejected login attempt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("no chat partner is configured for {0}")]
    NoPartner(String),
}
