// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models exchanged with the backend.

pub mod tokens;
pub mod upload;
pub mod user;
pub mod wardrobe;

pub use tokens::{RefreshRequest, RefreshResponse, TokenPair};
pub use upload::FileUpload;
pub use user::{AuthResponse, Credentials, Gender, Registration, UserProfile};
pub use wardrobe::{
    CategoryOption, ClassificationResult, ClassifiedMetadata, ClothingCategory, ClothingItem,
    ClothingMetadata, EventType, NewClothingItem,
};
