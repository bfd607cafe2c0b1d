//! Pure payload checks. Each function reports the first violation it finds.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use emberfall_types::api::CharacterPayload;
use emberfall_types::models::{Equipment, Gender, Race, Role, Stats};

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid username regex"));

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 100;
pub const CHARACTER_NAME_MAX: usize = 50;

const STAT_FIELDS: [&str; 6] = ["health", "maxHealth", "strength", "magic", "speed", "defense"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

pub type Validation<T = ()> = Result<T, ValidationError>;

pub fn validate_username(username: &str) -> Validation {
    let username = username.trim();
    if username.is_empty() {
        return Err(ValidationError::new("Username is required"));
    }
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(ValidationError::new(format!(
            "Username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"
        )));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(ValidationError::new(
            "Username can only contain letters, numbers, and underscores",
        ));
    }
    Ok(())
}

/// Absent or blank email is valid.
pub fn validate_email(email: Option<&str>) -> Validation {
    match email.map(str::trim) {
        None | Some("") => Ok(()),
        Some(email) if EMAIL_RE.is_match(email) => Ok(()),
        Some(_) => Err(ValidationError::new("Invalid email format")),
    }
}

pub fn validate_password(password: &str) -> Validation {
    if password.is_empty() {
        return Err(ValidationError::new("Password is required"));
    }
    let len = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        return Err(ValidationError::new(format!(
            "Password must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters"
        )));
    }
    Ok(())
}

/// A character payload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterDraft {
    pub name: String,
    pub race: Race,
    pub gender: Gender,
    pub appearance: Map<String, Value>,
    pub stats: Stats,
    pub equipment: Equipment,
}

pub fn validate_character(payload: &CharacterPayload) -> Validation<CharacterDraft> {
    let name = payload.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(ValidationError::new("Character name is required"));
    }
    if name.chars().count() > CHARACTER_NAME_MAX {
        return Err(ValidationError::new(format!(
            "Character name must be {CHARACTER_NAME_MAX} characters or less"
        )));
    }

    let race = payload
        .race
        .as_deref()
        .and_then(|r| r.parse::<Race>().ok())
        .ok_or_else(|| {
            let all: Vec<&str> = Race::ALL.iter().map(Race::as_str).collect();
            ValidationError::new(format!("Invalid race. Must be one of: {}", all.join(", ")))
        })?;

    let gender = payload
        .gender
        .as_deref()
        .and_then(|g| g.parse::<Gender>().ok())
        .ok_or_else(|| {
            let all: Vec<&str> = Gender::ALL.iter().map(Gender::as_str).collect();
            ValidationError::new(format!("Invalid gender. Must be one of: {}", all.join(", ")))
        })?;

    let appearance = match &payload.appearance {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err(ValidationError::new("Appearance must be an object")),
    };

    let stats = validate_stats(payload.stats.as_ref())?;
    let equipment = validate_equipment(payload.equipment.as_ref())?;

    Ok(CharacterDraft {
        name: name.to_string(),
        race,
        gender,
        appearance,
        stats,
        equipment,
    })
}

fn validate_stats(stats: Option<&Value>) -> Validation<Stats> {
    let Some(Value::Object(stats)) = stats else {
        return Err(ValidationError::new("Stats are required"));
    };

    let mut values = [0.0f64; STAT_FIELDS.len()];
    for (slot, field) in values.iter_mut().zip(STAT_FIELDS) {
        *slot = stats
            .get(field)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| {
                ValidationError::new(format!("Invalid stat: {field} must be a non-negative number"))
            })?;
    }

    let level = match stats.get("level") {
        None | Some(Value::Null) => None,
        Some(level) => Some(
            level
                .as_f64()
                .filter(|v| v.is_finite() && *v >= 1.0)
                .ok_or_else(|| ValidationError::new("Level must be a number of at least 1"))?,
        ),
    };

    let extra = stats
        .iter()
        .filter(|(key, _)| *key != "level" && !STAT_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let [health, max_health, strength, magic, speed, defense] = values;
    Ok(Stats {
        health,
        max_health,
        strength,
        magic,
        speed,
        defense,
        level,
        extra,
    })
}

fn validate_equipment(equipment: Option<&Value>) -> Validation<Equipment> {
    let slots = match equipment {
        None | Some(Value::Null) => return Ok(Equipment::default()),
        Some(Value::Object(slots)) => slots,
        Some(_) => return Err(ValidationError::new("Equipment must be an object")),
    };

    let slot = |name: &str| slots.get(name).filter(|item| !item.is_null()).cloned();
    Ok(Equipment {
        weapon: slot("weapon"),
        armor: slot("armor"),
        helmet: slot("helmet"),
    })
}

/// Upper bounds a role may submit. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatLimits {
    pub max_health: Option<f64>,
    pub max_attribute: Option<f64>,
    pub max_level: Option<f64>,
}

impl StatLimits {
    pub const USER: StatLimits = StatLimits {
        max_health: Some(1000.0),
        max_attribute: Some(100.0),
        max_level: Some(100.0),
    };

    pub const UNBOUNDED: StatLimits = StatLimits {
        max_health: None,
        max_attribute: None,
        max_level: None,
    };

    pub fn for_role(role: Role) -> Self {
        match role {
            Role::User => Self::USER,
            Role::Admin => Self::UNBOUNDED,
        }
    }

    /// Names the first stat above its cap, if any.
    pub fn check(&self, stats: &Stats) -> Result<(), String> {
        let checks = [
            ("health", stats.health, self.max_health),
            ("maxHealth", stats.max_health, self.max_health),
            ("strength", stats.strength, self.max_attribute),
            ("magic", stats.magic, self.max_attribute),
            ("speed", stats.speed, self.max_attribute),
            ("defense", stats.defense, self.max_attribute),
            ("level", stats.level.unwrap_or(1.0), self.max_level),
        ];

        for (field, value, cap) in checks {
            if let Some(cap) = cap {
                if value > cap {
                    return Err(format!(
                        "{field} of {value} exceeds the limit of {cap} for this account"
                    ));
                }
            }
        }
        Ok(())
    }
}
