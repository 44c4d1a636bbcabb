// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wardrobe backend HTTP client.
//!
//! Handles:
//! - Replayable request descriptions (`ApiRequest`)
//! - Login, registration and token refresh endpoints
//! - Status checking and JSON decoding of replies

use crate::config::Config;
use crate::error::AppError;
use crate::models::{
    AuthResponse, Credentials, FileUpload, RefreshRequest, RefreshResponse, Registration,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Body of an outbound request.
///
/// Multipart forms are kept as plain fields rather than a `reqwest` form,
/// which cannot be cloned, so a request can be sent again after a refresh.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormField>),
}

/// One field of a multipart form.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone)]
pub enum FormValue {
    Text(String),
    File(FileUpload),
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, file: FileUpload) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File(file),
        }
    }
}

/// Description of a backend call that can be issued more than once.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the backend base URL, starting with `/`
    pub path: String,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, AppError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach a multipart form body.
    pub fn multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }
}

/// Low-level backend client. Knows nothing about stored sessions; callers
/// pass the access token explicitly.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(config.api_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send a request, optionally with a bearer token. Any HTTP status is
    /// returned as a response; only transport failures are errors.
    pub async fn send(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<reqwest::Response, AppError> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path));

        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => builder.multipart(build_form(fields)?),
        };

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            authorized = access_token.is_some(),
            "Sending backend request"
        );

        Ok(builder.send().await?)
    }

    /// Log in with email and password.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, AppError> {
        let request = ApiRequest::post("/users/login/").json(credentials)?;
        let response = self.send(&request, None).await?;
        decode_json(response).await
    }

    /// Create an account. Registration also logs the user in.
    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, AppError> {
        let mut fields = vec![
            FormField::text("first_name", registration.first_name.clone()),
            FormField::text("last_name", registration.last_name.clone()),
            FormField::text("email", registration.email.clone()),
            FormField::text("password", registration.password.clone()),
            FormField::text("gender", registration.gender.as_code()),
            FormField::text(
                "birthday",
                registration.birthday.format("%Y-%m-%d").to_string(),
            ),
        ];
        if let Some(phone) = &registration.phone_number {
            fields.push(FormField::text("phone_number", phone.clone()));
        }
        if let Some(image) = &registration.profile_image {
            fields.push(FormField::file("profile_image", image.clone()));
        }

        let request = ApiRequest::post("/users/register/").multipart(fields);
        let response = self.send(&request, None).await?;
        decode_json(response).await
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Returns `None` when the backend answered 2xx without an access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Option<String>, AppError> {
        let request = ApiRequest::post("/users/token/refresh/").json(&RefreshRequest {
            refresh: refresh_token,
        })?;
        let response = self.send(&request, None).await?;
        let body: RefreshResponse = decode_json(response).await?;
        Ok(body.access.filter(|a| !a.is_empty()))
    }
}

fn build_form(fields: &[FormField]) -> Result<Form, AppError> {
    let mut form = Form::new();
    for field in fields {
        form = match &field.value {
            FormValue::Text(text) => form.text(field.name.clone(), text.clone()),
            FormValue::File(file) => {
                let part = Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone())
                    .mime_str(&file.content_type)?;
                form.part(field.name.clone(), part)
            }
        };
    }
    Ok(form)
}

/// Check response status and return an error if not successful.
pub async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::Api {
        status,
        message: error_message(status, &body),
    })
}

/// Check response and parse JSON body.
pub async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AppError> {
    let response = check_response(response).await?;
    let status = response.status();
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| AppError::Api {
        status,
        message: format!("JSON parse error: {}", e),
    })
}

/// Prefer the backend's `{"error": "..."}` message over the raw body.
fn error_message(status: StatusCode, body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<String>,
        detail: Option<String>,
        message: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(msg) = parsed.error.or(parsed.detail).or(parsed.message) {
            return msg;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.to_string()
    }
}
