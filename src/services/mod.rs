// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - backend access and session logic.

pub mod backend;
pub mod session;
pub mod wardrobe;

pub use backend::{ApiRequest, BackendClient, FormField, FormValue, RequestBody};
pub use session::{AuthState, SessionEvent, SessionManager};
pub use wardrobe::WardrobeService;
