use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{
        Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use emberfall_types::api::{Envelope, HealthResponse};

use crate::error::ApiError;
use crate::state::AppState;
use crate::{auth, characters};

/// JSON bodies are small; character appearance bags included.
pub const BODY_LIMIT: usize = 64 * 1024;

/// Build the full HTTP application: every route, the 405/404 fallbacks, CORS
/// and request tracing.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register).fallback(method_not_allowed))
        .route("/login", post(auth::login).fallback(method_not_allowed))
        .route("/verify", get(auth::verify).fallback(method_not_allowed));

    let character_routes = Router::new()
        .route(
            "/create",
            post(characters::create_character).fallback(method_not_allowed),
        )
        .route(
            "/get",
            get(characters::list_characters).fallback(method_not_allowed),
        )
        .route(
            "/update",
            put(characters::update_character).fallback(method_not_allowed),
        )
        .route(
            "/delete",
            delete(characters::delete_character).fallback(method_not_allowed),
        );

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/characters", character_routes)
        .route("/api/health", get(health).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin; the browser client is served from elsewhere.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(false)
}

async fn method_not_allowed(method: Method) -> Response {
    if method == Method::OPTIONS {
        return (StatusCode::OK, Json(Envelope::acknowledged("OK"))).into_response();
    }
    ApiError::MethodNotAllowed.into_response()
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.db_exec(|db| db.ping()).await?;
    Ok(Json(Envelope::success(
        "OK",
        HealthResponse {
            status: "ok".to_string(),
        },
    )))
}
