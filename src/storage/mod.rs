// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable key/value storage for the session.
//!
//! The session core only needs three operations, so storage is a small
//! trait object injected at construction time.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage key names as constants.
pub mod keys {
    /// Serialized `TokenPair`
    pub const TOKENS: &str = "auth_tokens";
    /// Serialized `UserProfile`
    pub const USER: &str = "user_data";
}

/// Key/value persistence capability.
///
/// Writes replace the whole value for a key. Readers always see the last write.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to persist session state: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode session state: {0}")]
    Encode(#[from] serde_json::Error),
}
