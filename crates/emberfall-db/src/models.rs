//! Database row types. These map directly to SQLite rows and stay distinct
//! from the wire models in emberfall-types so the storage layout can change
//! without touching the API.

use chrono::{DateTime, SecondsFormat, Utc};
use emberfall_types::models::{Character, Gender, Race, Role, UserSummary};

use crate::{DbError, Result};

/// Timestamp text format for every stored column: RFC 3339, UTC, microsecond
/// precision, so lexical order is chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(table: &'static str, id: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DbError::Corrupt {
            table,
            id: id.to_string(),
            detail: format!("timestamp '{raw}': {e}"),
        })
}

#[derive(Debug, Clone)]
pub struct AccountRow {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl AccountRow {
    pub fn role(&self) -> Result<Role> {
        self.role.parse::<Role>().map_err(|e| DbError::Corrupt {
            table: "accounts",
            id: self.id.clone(),
            detail: format!("role: {e}"),
        })
    }

    pub fn summary(&self) -> Result<UserSummary> {
        Ok(UserSummary {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CharacterRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub race: String,
    pub gender: String,
    /// JSON object text.
    pub appearance: String,
    /// JSON object text.
    pub stats: String,
    /// JSON object text.
    pub equipment: String,
    pub created_at: String,
    pub updated_at: String,
}

impl CharacterRow {
    pub fn from_character(character: &Character) -> Result<Self> {
        Ok(Self {
            id: character.id.clone(),
            owner_id: character.owner_id.clone(),
            name: character.name.clone(),
            race: character.race.as_str().to_string(),
            gender: character.gender.as_str().to_string(),
            appearance: serde_json::to_string(&character.appearance)?,
            stats: serde_json::to_string(&character.stats)?,
            equipment: serde_json::to_string(&character.equipment)?,
            created_at: format_timestamp(character.created_at),
            updated_at: format_timestamp(character.updated_at),
        })
    }

    pub fn into_character(self) -> Result<Character> {
        const TABLE: &str = "characters";
        let corrupt = |detail: String| DbError::Corrupt {
            table: TABLE,
            id: self.id.clone(),
            detail,
        };

        let race = self
            .race
            .parse::<Race>()
            .map_err(|e| corrupt(format!("race: {e}")))?;
        let gender = self
            .gender
            .parse::<Gender>()
            .map_err(|e| corrupt(format!("gender: {e}")))?;
        let created_at = parse_timestamp(TABLE, &self.id, &self.created_at)?;
        let updated_at = parse_timestamp(TABLE, &self.id, &self.updated_at)?;

        Ok(Character {
            appearance: serde_json::from_str(&self.appearance)?,
            stats: serde_json::from_str(&self.stats)?,
            equipment: serde_json::from_str(&self.equipment)?,
            race,
            gender,
            created_at,
            updated_at,
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
        })
    }
}
