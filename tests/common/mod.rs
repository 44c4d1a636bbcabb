// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process mock of the wardrobe backend.
//!
//! Runs an axum server on an ephemeral port. Access tokens are issued as
//! `a1`, `a2`, ... and the refresh token is always `r1`. Counters record how
//! many protected calls and refresh calls the client made.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use smart_wardrobe_client::services::{BackendClient, SessionManager, WardrobeService};
use smart_wardrobe_client::storage::MemoryStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const EMAIL: &str = "ann@example.com";
pub const PASSWORD: &str = "secret";
pub const REFRESH_TOKEN: &str = "r1";

/// Mutable mock backend state, shared with the test.
pub struct MockState {
    pub valid_access: Mutex<String>,
    pub issued: AtomicUsize,
    /// Protected endpoint calls (items, media, classifier, outfits, /boom/)
    pub attempts: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    /// Answer 401 to every protected call
    pub reject_all: AtomicBool,
    /// Answer 400 to every refresh call
    pub refuse_refresh: AtomicBool,
    pub refresh_delay_ms: AtomicU64,
    /// Delay before answering the item list
    pub slow_items_ms: AtomicU64,
    /// `user` object of the login reply
    pub login_user: Mutex<Value>,
    pub classifier_category: Mutex<String>,
    pub classifier_description: Mutex<String>,
    /// `None` leaves `colors` out of the classifier reply
    pub classifier_colors: Mutex<Option<Vec<String>>>,
    pub segmented_image: Mutex<Option<String>>,
    /// Fields of each multipart create / register request
    pub created: Mutex<Vec<HashMap<String, String>>>,
    pub registrations: Mutex<Vec<HashMap<String, String>>>,
}

impl MockState {
    fn new() -> Self {
        Self {
            valid_access: Mutex::new("a1".to_string()),
            issued: AtomicUsize::new(1),
            attempts: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            reject_all: AtomicBool::new(false),
            refuse_refresh: AtomicBool::new(false),
            refresh_delay_ms: AtomicU64::new(0),
            slow_items_ms: AtomicU64::new(0),
            login_user: Mutex::new(user_json()),
            classifier_category: Mutex::new("Upper Clothing".to_string()),
            classifier_description: Mutex::new("Blue linen shirt".to_string()),
            classifier_colors: Mutex::new(Some(vec!["#1e3a8a".to_string()])),
            segmented_image: Mutex::new(None),
            created: Mutex::new(Vec::new()),
            registrations: Mutex::new(Vec::new()),
        }
    }

    pub fn current_access(&self) -> String {
        self.valid_access.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        if self.reject_all.load(Ordering::SeqCst) {
            return false;
        }
        let expected = format!("Bearer {}", self.current_access());
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .is_some_and(|h| h == expected)
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::new());

        let app = Router::new()
            .route("/users/login/", post(login))
            .route("/users/register/", post(register))
            .route("/users/token/refresh/", post(refresh))
            .route("/wardrobe/clothing-items/", get(list_items).post(create_item))
            .route("/wardrobe/clothing-items/categories/", get(categories))
            .route("/wardrobe/clothing-items/{id}/", delete(delete_item))
            .route(
                "/wardrobe/clothing-items/{id}/update_metadata/",
                post(update_metadata),
            )
            .route("/clothing-processor/process/", post(process))
            .route("/media/processed_clothes/{name}", get(media))
            .route("/api/outfits/generate/", post(outfit))
            .route("/boom/", get(boom))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn backend_client(&self) -> BackendClient {
        BackendClient::new(self.base_url.clone(), Duration::from_secs(5)).unwrap()
    }

    /// Session over a fresh in-memory store.
    #[allow(dead_code)]
    pub fn session(&self) -> (SessionManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::new(self.backend_client(), store.clone());
        (session, store)
    }

    #[allow(dead_code)]
    pub fn wardrobe(&self) -> (WardrobeService, Arc<MemoryStore>) {
        let (session, store) = self.session();
        (WardrobeService::new(session), store)
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Given token not valid for any token type" })),
    )
        .into_response()
}

fn user_json() -> Value {
    json!({
        "id": 1,
        "username": "ann",
        "email": EMAIL,
        "first_name": "Ann",
        "last_name": "Lee",
        "gender": "F",
        "phone_number": null,
        "photo_path": null
    })
}

fn item_json(id: u64, name: &str, category: &str, metadata: Value) -> Value {
    json!({
        "id": id,
        "name": name,
        "category": category,
        "category_display": "Upper Clothing",
        "original_image": "clothes/original/shirt.jpg",
        "original_image_url": "http://testserver/media/clothes/original/shirt.jpg",
        "segmented_image": null,
        "segmented_image_url": null,
        "metadata": metadata,
        "created_at": "2025-03-01T10:00:00Z",
        "updated_at": "2025-03-01T10:00:00Z"
    })
}

/// Text fields by name; files recorded as `file:<name>:<len>`.
async fn read_fields(mut multipart: Multipart) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.unwrap();
        let value = match file_name {
            Some(file) => format!("file:{}:{}", file, data.len()),
            None => String::from_utf8_lossy(&data).into_owned(),
        };
        fields.insert(name, value);
    }
    fields
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if body["email"] == EMAIL && body["password"] == PASSWORD {
        Json(json!({
            "message": "success",
            "user": *state.login_user.lock().unwrap(),
            "tokens": { "access": state.current_access(), "refresh": REFRESH_TOKEN }
        }))
        .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid credentials" })),
        )
            .into_response()
    }
}

async fn register(State(state): State<Arc<MockState>>, multipart: Multipart) -> Response {
    let fields = read_fields(multipart).await;
    let user = json!({
        "id": 2,
        "email": fields.get("email"),
        "first_name": fields.get("first_name"),
        "last_name": fields.get("last_name"),
        "gender": fields.get("gender"),
    });
    state.registrations.lock().unwrap().push(fields);
    (
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": user,
            "tokens": { "access": state.current_access(), "refresh": REFRESH_TOKEN }
        })),
    )
        .into_response()
}

async fn refresh(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    if state.refuse_refresh.load(Ordering::SeqCst) || body["refresh"] != REFRESH_TOKEN {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Token refresh failed: Token is invalid or expired" })),
        )
            .into_response();
    }

    let n = state.issued.fetch_add(1, Ordering::SeqCst) + 1;
    let access = format!("a{}", n);
    *state.valid_access.lock().unwrap() = access.clone();
    Json(json!({ "access": access })).into_response()
}

async fn list_items(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.attempts.fetch_add(1, Ordering::SeqCst);
    let delay = state.slow_items_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(json!([item_json(
        1,
        "Blue linen shirt",
        "upper",
        json!({ "colors": ["#1e3a8a"], "description": "Blue linen shirt" })
    )]))
    .into_response()
}

async fn create_item(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    state.attempts.fetch_add(1, Ordering::SeqCst);
    let fields = read_fields(multipart).await;
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let metadata: Value = fields
        .get("metadata")
        .and_then(|m| serde_json::from_str(m).ok())
        .unwrap_or(Value::Null);
    let body = item_json(
        42,
        fields.get("name").map(String::as_str).unwrap_or_default(),
        fields.get("category").map(String::as_str).unwrap_or("upper"),
        metadata,
    );
    state.created.lock().unwrap().push(fields);
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn categories(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.attempts.fetch_add(1, Ordering::SeqCst);
    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        { "value": "upper", "label": "Upper Clothing" },
        { "value": "lower", "label": "Lower Clothing" },
        { "value": "dress", "label": "Dress" },
        { "value": "outerwear", "label": "Outerwear" },
        { "value": "shoes", "label": "Shoes" },
        { "value": "accessories", "label": "Accessories" }
    ]))
    .into_response()
}

async fn delete_item(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    state.attempts.fetch_add(1, Ordering::SeqCst);
    if !state.authorized(&headers) {
        return unauthorized();
    }
    if id == 1 {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
    }
}

async fn update_metadata(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    state.attempts.fetch_add(1, Ordering::SeqCst);
    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(item_json(id, "Blue linen shirt", "upper", body["metadata"].clone())).into_response()
}

async fn process(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    state.attempts.fetch_add(1, Ordering::SeqCst);
    let fields = read_fields(multipart).await;
    if !state.authorized(&headers) {
        return unauthorized();
    }
    if !fields.get("image").is_some_and(|v| v.starts_with("file:")) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No image file provided" })),
        )
            .into_response();
    }
    let mut metadata = json!({ "description": *state.classifier_description.lock().unwrap() });
    if let Some(colors) = &*state.classifier_colors.lock().unwrap() {
        metadata["colors"] = json!(colors);
    }
    Json(json!({
        "category": *state.classifier_category.lock().unwrap(),
        "metadata": metadata,
        "segmented_image_url": *state.segmented_image.lock().unwrap()
    }))
    .into_response()
}

async fn media(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Response {
    state.attempts.fetch_add(1, Ordering::SeqCst);
    if !state.authorized(&headers) {
        return unauthorized();
    }
    if name.starts_with("missing") {
        return StatusCode::NOT_FOUND.into_response();
    }
    (
        [(header::CONTENT_TYPE, "image/jpeg")],
        b"segmented-image-bytes".to_vec(),
    )
        .into_response()
}

async fn outfit(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.attempts.fetch_add(1, Ordering::SeqCst);
    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "event_type": body["event_type"], "items": [1] })).into_response()
}

async fn boom(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.attempts.fetch_add(1, Ordering::SeqCst);
    if !state.authorized(&headers) {
        return unauthorized();
    }
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "boom" })),
    )
        .into_response()
}
