// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Clothing items, classifier output and outfit requests.

use super::FileUpload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Colours used when the classifier reports none.
pub const DEFAULT_COLORS: &[&str] = &["#000000"];
/// Description used when the classifier reports none.
pub const DEFAULT_DESCRIPTION: &str = "A clothing item";
/// Item name used when there is no description to name it after.
pub const DEFAULT_ITEM_NAME: &str = "New Clothing Item";

/// Category choices accepted by the wardrobe endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClothingCategory {
    Upper,
    Lower,
    Dress,
    Outerwear,
    Shoes,
    Accessories,
}

impl ClothingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClothingCategory::Upper => "upper",
            ClothingCategory::Lower => "lower",
            ClothingCategory::Dress => "dress",
            ClothingCategory::Outerwear => "outerwear",
            ClothingCategory::Shoes => "shoes",
            ClothingCategory::Accessories => "accessories",
        }
    }

    /// Map a classifier label such as "Upper Clothing" onto a category.
    /// Unrecognised labels fall back to `Upper`.
    pub fn from_classifier_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "upper clothing" | "upper" => ClothingCategory::Upper,
            "lower clothing" | "lower" => ClothingCategory::Lower,
            "dress" => ClothingCategory::Dress,
            "outerwear" => ClothingCategory::Outerwear,
            "shoes" => ClothingCategory::Shoes,
            "accessories" => ClothingCategory::Accessories,
            _ => ClothingCategory::Upper,
        }
    }
}

/// Free-form description attached to each item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClothingMetadata {
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// Metadata as reported by the classifier, where either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedMetadata {
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ClassifiedMetadata {
    fn described(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.trim().is_empty())
    }

    /// Name for a new item: its description, if there is one.
    pub fn item_name(&self) -> String {
        self.described().unwrap_or(DEFAULT_ITEM_NAME).to_string()
    }

    /// Fill in the defaults the wardrobe endpoint requires. Only a missing
    /// colour list is replaced; an empty one is kept.
    pub fn into_metadata(self) -> ClothingMetadata {
        let description = self.described().unwrap_or(DEFAULT_DESCRIPTION).to_string();
        ClothingMetadata {
            colors: self
                .colors
                .unwrap_or_else(|| DEFAULT_COLORS.iter().map(|c| c.to_string()).collect()),
            description,
        }
    }
}

/// A stored clothing item as returned by `GET /wardrobe/clothing-items/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothingItem {
    pub id: u64,
    pub name: String,
    pub category: ClothingCategory,
    #[serde(default)]
    pub category_display: Option<String>,
    #[serde(default)]
    pub original_image: Option<String>,
    #[serde(default)]
    pub original_image_url: Option<String>,
    #[serde(default)]
    pub segmented_image: Option<String>,
    #[serde(default)]
    pub segmented_image_url: Option<String>,
    #[serde(default)]
    pub metadata: ClothingMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of the multipart create request.
#[derive(Debug, Clone)]
pub struct NewClothingItem {
    pub name: String,
    pub category: ClothingCategory,
    pub original_image: FileUpload,
    pub segmented_image: Option<FileUpload>,
    pub metadata: ClothingMetadata,
}

/// Entry of `GET /wardrobe/clothing-items/categories/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
}

/// Reply of the image classification service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub metadata: ClassifiedMetadata,
    #[serde(default)]
    pub segmented_image_url: Option<String>,
}

impl ClassificationResult {
    /// The classifier recognised the garment.
    pub fn is_identified(&self) -> bool {
        self.category
            .as_deref()
            .map(str::trim)
            .is_some_and(|c| !c.is_empty() && !c.eq_ignore_ascii_case("unknown"))
    }

    /// File name of the segmented image, if the classifier produced one.
    ///
    /// The service reports a server-side path which may use either separator.
    pub fn segmented_image_name(&self) -> Option<&str> {
        let path = self.segmented_image_url.as_deref()?.trim();
        path.rsplit(['\\', '/']).next().filter(|n| !n.is_empty())
    }
}

/// Occasion an outfit is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Formal,
    Casual,
    Sport,
}
