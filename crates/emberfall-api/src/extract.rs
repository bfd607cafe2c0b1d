use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts},
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use crate::token::{Claims, extract_from_header};

/// The caller behind a verified bearer token. Handlers taking this never run
/// for unauthenticated requests.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let Some(token) = extract_from_header(header_value) else {
            debug!("Missing bearer token on {}", parts.uri.path());
            return Err(ApiError::Authentication("Authentication required".into()));
        };

        let claims = state.tokens.verify(token).ok_or_else(|| {
            debug!("Rejected bearer token on {}", parts.uri.path());
            ApiError::Authentication("Invalid or expired token".into())
        })?;

        Ok(AuthUser(claims))
    }
}

/// JSON body where an empty body means `T::default()`. Update and delete take
/// the character id from either the query string or the body, so the body is
/// optional there.
#[derive(Debug)]
pub struct OptionalJson<T>(pub T);

impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e.body_text())))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(T::default()));
        }

        serde_json::from_slice(&bytes)
            .map(OptionalJson)
            .map_err(|e| ApiError::Validation(format!("Invalid request body: {e}")))
    }
}
