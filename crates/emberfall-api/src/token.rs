use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use emberfall_types::models::Role;

/// Tokens expire after 7 days unless configured otherwise.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::days(7);

/// What a caller asks to have signed into a token.
#[derive(Debug, Clone)]
pub struct TokenPayload {
    pub user_id: String,
    pub username: String,
    /// Defaults to [`Role::User`] when absent.
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signing secret plus token lifetime.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, DEFAULT_TOKEN_TTL)
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, payload: &TokenPayload) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id: payload.user_id.clone(),
            username: payload.username.clone(),
            role: payload.role.unwrap_or_default(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// `None` on any signature, format or expiry failure.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!("Token rejected: {}", e);
                None
            }
        }
    }
}

/// Pull the token out of an Authorization header value. Accepts
/// `Bearer <token>` or the bare token.
pub fn extract_from_header(header: Option<&str>) -> Option<&str> {
    let value = header?.trim();
    let token = match value.split_once(' ') {
        Some(("Bearer", rest)) => rest.trim(),
        _ if value == "Bearer" => "",
        _ => value,
    };
    (!token.is_empty()).then_some(token)
}
