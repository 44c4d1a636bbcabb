// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error types.

use crate::storage::StorageError;
use reqwest::StatusCode;

/// Application error type returned by the session core and the API wrappers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Refresh token missing or rejected. The stored session has been
    /// cleared (except when nothing was stored to begin with).
    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Token pair must have non-empty access and refresh tokens")]
    InvalidTokens,

    /// Backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Could not identify the clothing item: {0}")]
    Unclassified(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// True when the caller should send the user back to sign-in.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, AppError::SessionExpired)
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AppError::Api { status, .. } => Some(*status),
            AppError::Request(e) => e.status(),
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, AppError>;
