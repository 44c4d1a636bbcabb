// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle and authorized requests.
//!
//! `SessionManager` is the single source of truth for whether the user is
//! logged in and which bearer token outbound requests carry. It persists the
//! token pair and cached profile through an injected `KeyValueStore`, and
//! repairs a single expired-token failure per request by refreshing the access
//! token and replaying the request once.

use crate::error::AppError;
use crate::models::{AuthResponse, Credentials, Registration, TokenPair, UserProfile};
use crate::services::backend::{ApiRequest, BackendClient};
use crate::storage::{keys, KeyValueStore};
use reqwest::StatusCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// Capacity of the session event channel. Slow subscribers only miss
/// intermediate events, never block the session.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Observable authentication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
    /// A token refresh is in flight.
    Refreshing,
    /// The last session ended because its refresh token was rejected.
    Expired,
}

/// Session lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    Refreshed,
    LoggedOut,
    /// The session could not be renewed; the host should send the user back
    /// to sign-in. Emitted once per session end.
    Expired,
}

/// Owns the stored session and issues authorized requests.
#[derive(Clone)]
pub struct SessionManager {
    backend: BackendClient,
    store: Arc<dyn KeyValueStore>,
    /// Serializes refresh operations so concurrent 401s share one refresh.
    refresh_lock: Arc<Mutex<()>>,
    /// Set when the session ended through a failed refresh.
    expired: Arc<AtomicBool>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(backend: BackendClient, store: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            backend,
            store,
            refresh_lock: Arc::new(Mutex::new(())),
            expired: Arc::new(AtomicBool::new(false)),
            events,
        }
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    // ─── Stored State ────────────────────────────────────────────────────────

    /// Persist a token pair. Every later request uses its access token.
    pub fn set_session(&self, tokens: &TokenPair) -> Result<(), AppError> {
        if !tokens.is_complete() {
            return Err(AppError::InvalidTokens);
        }
        let raw = serde_json::to_string(tokens)?;
        self.store.set(keys::TOKENS, &raw)?;
        self.expired.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Persist the cached user profile. Independent of the tokens.
    pub fn set_user_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let raw = serde_json::to_string(profile)?;
        self.store.set(keys::USER, &raw)?;
        Ok(())
    }

    /// Stored token pair. Absent or unparseable storage reads as `None`.
    pub fn get_tokens(&self) -> Option<TokenPair> {
        self.read_json(keys::TOKENS)
    }

    /// Cached user profile. Absent or unparseable storage reads as `None`.
    pub fn get_user_profile(&self) -> Option<UserProfile> {
        self.read_json(keys::USER)
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring corrupt session storage");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_tokens().is_some_and(|t| !t.access.is_empty())
    }

    pub fn auth_state(&self) -> AuthState {
        if self.refresh_lock.try_lock().is_err() {
            AuthState::Refreshing
        } else if self.is_authenticated() {
            AuthState::Authenticated
        } else if self.expired.load(Ordering::SeqCst) {
            AuthState::Expired
        } else {
            AuthState::Unauthenticated
        }
    }

    /// `Authorization` header value for the current access token.
    pub fn authorization_header(&self) -> Option<String> {
        self.get_tokens()
            .filter(|t| !t.access.is_empty())
            .map(|t| format!("Bearer {}", t.access))
    }

    /// Remove tokens and profile. Safe to call without a session.
    pub fn clear_session(&self) -> Result<(), AppError> {
        self.store.remove(keys::TOKENS)?;
        self.store.remove(keys::USER)?;
        Ok(())
    }

    /// Clear the session after a failed refresh and notify subscribers once.
    fn expire_session(&self) {
        if let Err(e) = self.clear_session() {
            tracing::error!(error = %e, "Failed to clear expired session");
        }
        if !self.expired.swap(true, Ordering::SeqCst) {
            tracing::warn!("Session expired, sign-in required");
            self.emit(SessionEvent::Expired);
        }
    }

    // ─── Login / Logout ──────────────────────────────────────────────────────

    /// Log in and store the returned session.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, AppError> {
        let auth = self.backend.login(credentials).await?;
        self.store_auth(&auth)?;
        tracing::info!(email = %credentials.email, "Logged in");
        Ok(auth)
    }

    /// Register a new account and store the returned session.
    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, AppError> {
        let auth = self.backend.register(registration).await?;
        self.store_auth(&auth)?;
        tracing::info!(email = %registration.email, "Registered and logged in");
        Ok(auth)
    }

    fn store_auth(&self, auth: &AuthResponse) -> Result<(), AppError> {
        self.set_session(&auth.tokens)?;
        self.set_user_profile(&auth.user)?;
        self.emit(SessionEvent::LoggedIn);
        Ok(())
    }

    /// End the session on the user's request.
    pub fn logout(&self) -> Result<(), AppError> {
        self.clear_session()?;
        self.expired.store(false, Ordering::SeqCst);
        tracing::info!("Logged out");
        self.emit(SessionEvent::LoggedOut);
        Ok(())
    }

    // ─── Token Refresh ───────────────────────────────────────────────────────

    /// Obtain a new access token with the stored refresh token.
    ///
    /// Fails with `SessionExpired` without touching storage when no refresh
    /// token is stored. When the backend rejects the refresh token the session
    /// is cleared before `SessionExpired` is returned.
    pub async fn refresh_access_token(&self) -> Result<TokenPair, AppError> {
        let seen = self.get_tokens().map(|t| t.access);
        self.refresh_after(seen.as_deref()).await
    }

    /// Refresh unless someone already replaced the access token `seen`.
    ///
    /// Callers queue on `refresh_lock`. Whoever gets it first talks to the
    /// backend; the others find a different access token in storage once they
    /// get the lock and return it without a second refresh call.
    async fn refresh_after(&self, seen: Option<&str>) -> Result<TokenPair, AppError> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.get_tokens();
        if let Some(tokens) = &current {
            if !tokens.access.is_empty() && Some(tokens.access.as_str()) != seen {
                tracing::debug!("Access token already refreshed by another request");
                return Ok(tokens.clone());
            }
        }

        let tokens = match current {
            Some(t) if !t.refresh.is_empty() => t,
            _ => {
                tracing::debug!("No refresh token stored");
                return Err(AppError::SessionExpired);
            }
        };

        tracing::info!("Access token rejected, refreshing");
        let access = match self.backend.refresh_token(&tokens.refresh).await {
            Ok(Some(access)) => access,
            Ok(None) => {
                tracing::warn!("Refresh reply carried no access token");
                self.expire_session();
                return Err(AppError::SessionExpired);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                self.expire_session();
                return Err(AppError::SessionExpired);
            }
        };

        let renewed = tokens.with_access(access);
        self.set_session(&renewed)?;
        tracing::info!("Access token refreshed");
        self.emit(SessionEvent::Refreshed);
        Ok(renewed)
    }

    // ─── Authorized Requests ─────────────────────────────────────────────────

    /// Send a request with the current access token.
    ///
    /// A 401 triggers one refresh and exactly one replay with the new token.
    /// Any other status, including errors, is returned unchanged. If the
    /// refresh fails, or the replay is rejected again, the session is cleared
    /// and `SessionExpired` is returned. A 401 without any stored session
    /// also returns `SessionExpired`, but the state stays `Unauthenticated`.
    pub async fn authorized_request(
        &self,
        request: &ApiRequest,
    ) -> Result<reqwest::Response, AppError> {
        let access = self
            .get_tokens()
            .map(|t| t.access)
            .filter(|a| !a.is_empty());

        let response = self.backend.send(request, access.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!(path = %request.path, "Request unauthorized, attempting refresh");
        let renewed = match self.refresh_after(access.as_deref()).await {
            Ok(tokens) => tokens,
            Err(AppError::SessionExpired) => {
                // With nothing stored there is no session left to end: the
                // user never logged in, or logged out while this was in flight.
                if self.get_tokens().is_some() {
                    self.expire_session();
                }
                return Err(AppError::SessionExpired);
            }
            Err(e) => return Err(e),
        };

        let retried = self.backend.send(request, Some(&renewed.access)).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(path = %request.path, "Request rejected after token refresh");
            self.expire_session();
            return Err(AppError::SessionExpired);
        }
        Ok(retried)
    }
}
