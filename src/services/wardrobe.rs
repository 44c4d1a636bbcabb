// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wardrobe API calls, all issued through the session so they share
//! token refresh and expiry handling.

use crate::error::AppError;
use crate::models::{
    CategoryOption, ClassificationResult, ClothingCategory, ClothingItem, ClothingMetadata,
    EventType, FileUpload, NewClothingItem,
};
use crate::services::backend::{check_response, decode_json, ApiRequest, FormField};
use crate::services::SessionManager;
use serde::de::DeserializeOwned;

const ITEMS_PATH: &str = "/wardrobe/clothing-items/";
const PROCESS_PATH: &str = "/clothing-processor/process/";
const PROCESSED_MEDIA_PATH: &str = "/media/processed_clothes/";
const OUTFIT_PATH: &str = "/api/outfits/generate/";

/// Typed wrapper over the wardrobe, classifier and outfit endpoints.
#[derive(Clone)]
pub struct WardrobeService {
    session: SessionManager,
}

impl WardrobeService {
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, AppError> {
        let response = self.session.authorized_request(&request).await?;
        decode_json(response).await
    }

    // ─── Clothing Items ──────────────────────────────────────────────────────

    /// All items of the current user, newest first.
    pub async fn list_items(&self) -> Result<Vec<ClothingItem>, AppError> {
        self.fetch_json(ApiRequest::get(ITEMS_PATH)).await
    }

    pub async fn categories(&self) -> Result<Vec<CategoryOption>, AppError> {
        self.fetch_json(ApiRequest::get(format!("{}categories/", ITEMS_PATH)))
            .await
    }

    pub async fn create_item(&self, item: &NewClothingItem) -> Result<ClothingItem, AppError> {
        let mut fields = vec![
            FormField::file("original_image", item.original_image.clone()),
            FormField::text("name", item.name.clone()),
            FormField::text("category", item.category.as_str()),
            FormField::text("metadata", serde_json::to_string(&item.metadata)?),
        ];
        if let Some(segmented) = &item.segmented_image {
            fields.push(FormField::file("segmented_image", segmented.clone()));
        }

        let item: ClothingItem = self
            .fetch_json(ApiRequest::post(ITEMS_PATH).multipart(fields))
            .await?;
        tracing::info!(item_id = item.id, category = item.category.as_str(), "Clothing item created");
        Ok(item)
    }

    pub async fn delete_item(&self, item_id: u64) -> Result<(), AppError> {
        let request = ApiRequest::delete(format!("{}{}/", ITEMS_PATH, item_id));
        let response = self.session.authorized_request(&request).await?;
        check_response(response).await?;
        tracing::info!(item_id, "Clothing item deleted");
        Ok(())
    }

    pub async fn update_metadata(
        &self,
        item_id: u64,
        metadata: &ClothingMetadata,
    ) -> Result<ClothingItem, AppError> {
        let request = ApiRequest::post(format!("{}{}/update_metadata/", ITEMS_PATH, item_id))
            .json(&serde_json::json!({ "metadata": metadata }))?;
        self.fetch_json(request).await
    }

    // ─── Classification / Outfits ────────────────────────────────────────────

    /// Run the image through the classification service.
    pub async fn classify_image(&self, image: &FileUpload) -> Result<ClassificationResult, AppError> {
        let request =
            ApiRequest::post(PROCESS_PATH).multipart(vec![FormField::file("image", image.clone())]);
        self.fetch_json(request).await
    }

    /// Ask the backend for an outfit suited to `event_type`.
    ///
    /// The reply shape is owned by the outfit generator and passed through.
    pub async fn generate_outfit(&self, event_type: EventType) -> Result<serde_json::Value, AppError> {
        let request =
            ApiRequest::post(OUTFIT_PATH).json(&serde_json::json!({ "event_type": event_type }))?;
        self.fetch_json(request).await
    }

    /// Download a processed image produced by the classifier.
    pub async fn fetch_processed_image(&self, file_name: &str) -> Result<FileUpload, AppError> {
        let request = ApiRequest::get(format!("{}{}", PROCESSED_MEDIA_PATH, file_name));
        let response = self.session.authorized_request(&request).await?;
        let response = check_response(response).await?;
        let bytes = response.bytes().await?;
        let mut image = FileUpload::new(file_name, bytes.to_vec());
        if image.content_type == "application/octet-stream" {
            image.content_type = "image/jpeg".to_string();
        }
        Ok(image)
    }

    // ─── Upload Pipeline ─────────────────────────────────────────────────────

    /// Classify an image and store it as a new clothing item.
    ///
    /// 1. Send the raw image to the classifier
    /// 2. Reject images the classifier could not identify
    /// 3. Map the classifier label onto a wardrobe category
    /// 4. Attach the segmented image when the classifier produced one
    /// 5. Create the item
    pub async fn upload_item(&self, image: FileUpload) -> Result<ClothingItem, AppError> {
        let classified = self.classify_image(&image).await?;
        if !classified.is_identified() {
            return Err(AppError::Unclassified(
                "Please try a clearer image".to_string(),
            ));
        }

        let label = classified.category.as_deref().unwrap_or_default();
        let category = ClothingCategory::from_classifier_label(label);
        tracing::debug!(label, category = category.as_str(), "Mapped classifier category");

        let segmented_image = match classified.segmented_image_name() {
            Some(name) => match self.fetch_processed_image(name).await {
                Ok(file) => Some(file),
                Err(AppError::SessionExpired) => return Err(AppError::SessionExpired),
                Err(e) => {
                    tracing::warn!(
                        file = name,
                        error = %e,
                        "Could not fetch segmented image, creating item without it"
                    );
                    None
                }
            },
            None => None,
        };

        let name = classified.metadata.item_name();

        let item = NewClothingItem {
            name,
            category,
            original_image: image,
            segmented_image,
            metadata: classified.metadata.into_metadata(),
        };
        self.create_item(&item).await
    }
}
