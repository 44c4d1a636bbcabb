// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Smart Wardrobe client: session handling and typed API access for the
//! Smart Wardrobe backend.
//!
//! The session core persists the user's token pair, attaches the access
//! token to every request, and transparently refreshes it once when the
//! backend answers 401.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

use config::Config;
use services::{BackendClient, SessionManager, WardrobeService};
use std::sync::Arc;
use storage::{FileStore, KeyValueStore};

/// Shared client state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: SessionManager,
    pub wardrobe: WardrobeService,
}

impl AppState {
    /// Build the client with the session persisted at `config.state_path`.
    pub fn from_config(config: Config) -> error::Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.state_path));
        Self::with_store(config, store)
    }

    /// Build the client on top of an arbitrary store.
    pub fn with_store(config: Config, store: Arc<dyn KeyValueStore>) -> error::Result<Self> {
        let backend = BackendClient::from_config(&config)?;
        let session = SessionManager::new(backend, store);
        let wardrobe = WardrobeService::new(session.clone());
        Ok(Self {
            config,
            session,
            wardrobe,
        })
    }
}
