//! User profile and authentication payloads.

use super::{FileUpload, TokenPair};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Cached user profile, mirrored from the login/registration response.
///
/// Kept as the JSON object the backend sent. Nothing about its shape is
/// checked; the accessors read fields leniently and give `None` for missing
/// or oddly typed values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Field rendered as text. Strings are returned as-is, numbers and
    /// booleans are formatted, anything else is treated as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<String> {
        self.text("id")
    }

    pub fn username(&self) -> Option<String> {
        self.text("username")
    }

    pub fn email(&self) -> Option<String> {
        self.text("email")
    }

    pub fn first_name(&self) -> Option<String> {
        self.text("first_name")
    }

    pub fn last_name(&self) -> Option<String> {
        self.text("last_name")
    }

    pub fn phone_number(&self) -> Option<String> {
        self.text("phone_number")
    }

    /// "First Last", falling back to username or email.
    pub fn display_name(&self) -> Option<String> {
        match (self.first_name(), self.last_name()) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first),
            (None, Some(last)) => Some(last),
            (None, None) => self.username().or_else(|| self.email()),
        }
    }
}

impl From<Map<String, Value>> for UserProfile {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Body of `POST /users/login/`.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login or registration reply.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub tokens: TokenPair,
    #[serde(default, deserialize_with = "profile_or_empty")]
    pub user: UserProfile,
}

/// A missing, null or non-object `user` becomes an empty profile rather than
/// failing the whole reply.
fn profile_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<UserProfile, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(fields) => UserProfile(fields),
        _ => UserProfile::default(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn as_code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    /// Accepts `M`/`F` or any word starting with either letter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('M') => Ok(Gender::Male),
            Some('F') => Ok(Gender::Female),
            _ => Err(format!("gender must be M or F, got {:?}", s)),
        }
    }
}

/// Fields of the multipart `POST /users/register/` form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub gender: Gender,
    pub birthday: NaiveDate,
    pub phone_number: Option<String>,
    pub profile_image: Option<FileUpload>,
}
