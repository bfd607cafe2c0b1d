use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, SubsecRound, Utc};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use emberfall_db::DbError;
use emberfall_db::models::CharacterRow;
use emberfall_types::api::{
    CharacterIdQuery, CharacterList, CharacterPayload, DeletedCharacter, Envelope,
};
use emberfall_types::models::{Character, Stats};

use crate::error::ApiError;
use crate::extract::{AuthUser, OptionalJson};
use crate::state::AppState;
use crate::token::Claims;
use crate::validation::{CharacterDraft, StatLimits, validate_character};

const DUPLICATE_NAME: &str = "You already have a character with this name";
const NOT_FOUND: &str = "Character not found";

/// Stored timestamps keep microseconds; truncate so responses match reads.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn enforce_stat_limits(claims: &Claims, stats: &Stats) -> Result<(), ApiError> {
    StatLimits::for_role(claims.role)
        .check(stats)
        .map_err(ApiError::Authorization)
}

/// Id from `?id=` wins over a body `id`.
fn require_id(query: CharacterIdQuery, body_id: Option<String>) -> Result<String, ApiError> {
    query
        .id
        .or(body_id)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::Validation("Character ID is required".to_string()))
}

fn build_character(
    id: String,
    owner_id: String,
    draft: CharacterDraft,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Character {
    Character {
        id,
        owner_id,
        name: draft.name,
        race: draft.race,
        gender: draft.gender,
        appearance: draft.appearance,
        stats: draft.stats,
        equipment: draft.equipment,
        created_at,
        updated_at,
    }
}

/// Lay the fields present in `patch` over the stored character. `stats` and
/// `equipment` replace wholesale when supplied.
fn merge_over(
    existing: &Character,
    patch: CharacterPayload,
) -> Result<CharacterPayload, serde_json::Error> {
    Ok(CharacterPayload {
        id: Some(existing.id.clone()),
        name: patch.name.or_else(|| Some(existing.name.clone())),
        race: patch.race.or_else(|| Some(existing.race.as_str().to_string())),
        gender: patch
            .gender
            .or_else(|| Some(existing.gender.as_str().to_string())),
        appearance: match patch.appearance {
            Some(appearance) => Some(appearance),
            None => Some(Value::Object(existing.appearance.clone())),
        },
        stats: match patch.stats {
            Some(stats) => Some(stats),
            None => Some(serde_json::to_value(&existing.stats)?),
        },
        equipment: match patch.equipment {
            Some(equipment) => Some(equipment),
            None => Some(serde_json::to_value(&existing.equipment)?),
        },
    })
}

/// POST /api/characters/create
pub async fn create_character(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    WithRejection(Json(payload), _): WithRejection<Json<CharacterPayload>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = validate_character(&payload)?;
    enforce_stat_limits(&claims, &draft.stats)?;

    let created_at = now();
    let character = build_character(
        Uuid::new_v4().to_string(),
        claims.user_id.clone(),
        draft,
        created_at,
        created_at,
    );
    let row = CharacterRow::from_character(&character)
        .map_err(|e| ApiError::from_db(e, DUPLICATE_NAME, state.expose_errors))?;

    state
        .db_call(DUPLICATE_NAME, move |db| {
            if db.character_name_taken(&row.owner_id, &row.name, None)? {
                return Err(DbError::Conflict(format!("characters.name '{}'", row.name)));
            }
            db.insert_character(&row)
        })
        .await?;

    info!(
        "Created character {} '{}' for {}",
        character.id, character.name, claims.username
    );

    Ok((
        StatusCode::CREATED,
        Json(Envelope::success("Character created successfully", character)),
    ))
}

/// GET /api/characters/get
pub async fn list_characters(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let owner_id = claims.user_id;
    let characters = state
        .db_exec(move |db| {
            db.list_characters(&owner_id)?
                .into_iter()
                .map(CharacterRow::into_character)
                .collect::<Result<Vec<_>, _>>()
        })
        .await?;

    Ok(Json(Envelope::success(
        "Characters retrieved successfully",
        CharacterList { characters },
    )))
}

/// PUT /api/characters/update
///
/// Returns the stored document after the write even when no field actually
/// changed; `updatedAt` is refreshed either way.
pub async fn update_character(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<CharacterIdQuery>, ApiError>,
    OptionalJson(patch): OptionalJson<CharacterPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = require_id(query, patch.id.clone())?;

    let (lookup_id, owner_id) = (id.clone(), claims.user_id.clone());
    let existing = state
        .db_exec(move |db| {
            db.get_character(&lookup_id, &owner_id)?
                .map(CharacterRow::into_character)
                .transpose()
        })
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    let merged =
        merge_over(&existing, patch).map_err(|e| ApiError::internal(e, state.expose_errors))?;
    let draft = validate_character(&merged)?;
    enforce_stat_limits(&claims, &draft.stats)?;

    let renamed = draft.name != existing.name;
    let updated = build_character(
        existing.id.clone(),
        existing.owner_id.clone(),
        draft,
        existing.created_at,
        now(),
    );
    let row = CharacterRow::from_character(&updated)
        .map_err(|e| ApiError::from_db(e, DUPLICATE_NAME, state.expose_errors))?;

    let stored = state
        .db_call(DUPLICATE_NAME, move |db| {
            if renamed && db.character_name_taken(&row.owner_id, &row.name, Some(&row.id))? {
                return Err(DbError::Conflict(format!("characters.name '{}'", row.name)));
            }
            if !db.update_character(&row)? {
                return Ok(None);
            }
            db.get_character(&row.id, &row.owner_id)?
                .map(CharacterRow::into_character)
                .transpose()
        })
        .await?
        // Deleted between the ownership check and the write.
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    info!("Updated character {} for {}", stored.id, claims.username);

    Ok(Json(Envelope::success("Character updated successfully", stored)))
}

/// DELETE /api/characters/delete
pub async fn delete_character(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<CharacterIdQuery>, ApiError>,
    OptionalJson(body): OptionalJson<CharacterIdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = require_id(query, body.id)?;

    let (target, owner_id) = (id.clone(), claims.user_id.clone());
    let deleted = state
        .db_exec(move |db| db.delete_character(&target, &owner_id))
        .await?;
    if !deleted {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }

    info!("Deleted character {} for {}", id, claims.username);

    Ok(Json(Envelope::success(
        "Character deleted successfully",
        DeletedCharacter { id },
    )))
}
