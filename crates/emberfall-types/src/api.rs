use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Character, Role, UserSummary};

// -- Envelope --

/// Uniform wrapper for every API response, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            error: false,
            message: message.into(),
            code: None,
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    /// Success with no payload.
    pub fn acknowledged(message: impl Into<String>) -> Self {
        Self {
            error: false,
            message: message.into(),
            code: None,
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            code: Some(code.into()),
            data: None,
        }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

// -- Characters --

/// Character fields as submitted by the client. Everything is optional so the
/// validator, not the deserializer, decides what is missing; free-form parts
/// stay as raw JSON until validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub appearance: Option<Value>,
    #[serde(default)]
    pub stats: Option<Value>,
    #[serde(default)]
    pub equipment: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CharacterList {
    pub characters: Vec<Character>,
}

/// `?id=` on update/delete routes.
#[derive(Debug, Default, Deserialize)]
pub struct CharacterIdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedCharacter {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
