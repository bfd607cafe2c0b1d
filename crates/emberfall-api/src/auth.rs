use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};
use uuid::Uuid;

use emberfall_db::models::{AccountRow, format_timestamp};
use emberfall_types::api::{AuthResponse, Envelope, LoginRequest, RegisterRequest, VerifyResponse};
use emberfall_types::models::Role;

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;
use crate::token::TokenPayload;
use crate::validation::{validate_email, validate_password, validate_username};

/// Same message for unknown user and wrong password.
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Hash checked when the username is unknown, so a miss costs the same
/// Argon2 work as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"emberfall-unknown-account", &salt)
        .map(|hash| hash.to_string())
        .ok()
});

fn invalid_credentials() -> ApiError {
    ApiError::Authentication(INVALID_CREDENTIALS.to_string())
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&req.username)?;
    validate_email(req.email.as_deref())?;
    validate_password(&req.password)?;

    let username = req.username.trim().to_lowercase();
    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_lowercase);

    // Check if username or email is taken
    let (u, e) = (username.clone(), email.clone());
    let taken = state
        .db_exec(move |db| {
            if db.get_account_by_username(&u)?.is_some() {
                return Ok(Some("Username already exists"));
            }
            if let Some(e) = e {
                if db.get_account_by_email(&e)?.is_some() {
                    return Ok(Some("Email already registered"));
                }
            }
            Ok(None)
        })
        .await?;
    if let Some(reason) = taken {
        return Err(ApiError::Conflict(reason.to_string()));
    }

    let password_hash = hash_password(&state, req.password).await?;

    let account = AccountRow {
        id: Uuid::new_v4().to_string(),
        username,
        email,
        password_hash,
        role: Role::User.as_str().to_string(),
        created_at: format_timestamp(chrono::Utc::now()),
        last_login: None,
    };

    // A concurrent registration can still win the race; the unique index decides.
    let row = account.clone();
    state
        .db_call("Username or email already exists", move |db| db.create_account(&row))
        .await?;

    let token = state
        .tokens
        .issue(&TokenPayload {
            user_id: account.id.clone(),
            username: account.username.clone(),
            role: Some(Role::User),
        })
        .map_err(|e| ApiError::internal(e, state.expose_errors))?;

    info!("Registered account {} ({})", account.username, account.id);

    let user = account
        .summary()
        .map_err(|e| ApiError::from_db(e, "", state.expose_errors))?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::success(
            "User registered successfully",
            AuthResponse { token, user },
        )),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let username = req.username.trim().to_lowercase();
    let lookup = username.clone();
    let Some(account) = state
        .db_exec(move |db| db.get_account_by_username(&lookup))
        .await?
    else {
        if let Some(dummy) = DUMMY_HASH.as_ref() {
            verify_password(&state, dummy.clone(), req.password).await?;
        }
        warn!("Login failed for unknown user '{}'", username);
        return Err(invalid_credentials());
    };

    if !verify_password(&state, account.password_hash.clone(), req.password).await? {
        warn!("Login failed for '{}': wrong password", username);
        return Err(invalid_credentials());
    }

    let user = account
        .summary()
        .map_err(|e| ApiError::from_db(e, "", state.expose_errors))?;

    let (id, now) = (account.id.clone(), format_timestamp(chrono::Utc::now()));
    state.db_exec(move |db| db.touch_last_login(&id, &now)).await?;

    let token = state
        .tokens
        .issue(&TokenPayload {
            user_id: user.id.clone(),
            username: user.username.clone(),
            role: Some(user.role),
        })
        .map_err(|e| ApiError::internal(e, state.expose_errors))?;

    info!("Account {} logged in", user.username);

    Ok(Json(Envelope::success(
        "Login successful",
        AuthResponse { token, user },
    )))
}

pub async fn verify(AuthUser(claims): AuthUser) -> impl IntoResponse {
    Json(Envelope::success(
        "Token is valid",
        VerifyResponse {
            user_id: claims.user_id,
            username: claims.username,
            role: claims.role,
        },
    ))
}

/// Argon2id with a fresh salt, off the async runtime.
async fn hash_password(state: &AppState, password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await
    .map_err(|e| ApiError::internal(format!("spawn_blocking join error: {e}"), state.expose_errors))?
    .map_err(|e| ApiError::internal(format!("password hashing failed: {e}"), state.expose_errors))
}

async fn verify_password(
    state: &AppState,
    stored_hash: String,
    password: String,
) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored_hash)?;
        Ok::<_, argon2::password_hash::Error>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
        )
    })
    .await
    .map_err(|e| ApiError::internal(format!("spawn_blocking join error: {e}"), state.expose_errors))?
    .map_err(|e| ApiError::internal(format!("stored password hash unreadable: {e}"), state.expose_errors))
}
