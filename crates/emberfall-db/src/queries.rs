use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::{AccountRow, CharacterRow};
use crate::{Database, Result};

const ACCOUNT_COLUMNS: &str =
    "id, username, email, password_hash, role, created_at, last_login";

const CHARACTER_COLUMNS: &str =
    "id, owner_id, name, race, gender, appearance, stats, equipment, created_at, updated_at";

impl Database {
    // -- Accounts --

    pub fn create_account(&self, account: &AccountRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO accounts (id, username, email, password_hash, role, created_at, last_login)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    account.id,
                    account.username,
                    account.email,
                    account.password_hash,
                    account.role,
                    account.created_at,
                    account.last_login,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_account_by_username(&self, username: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account(conn, "username", username))
    }

    pub fn get_account_by_email(&self, email: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account(conn, "email", email))
    }

    pub fn touch_last_login(&self, id: &str, at: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE accounts SET last_login = ?2 WHERE id = ?1",
                params![id, at],
            )?;
            Ok(())
        })
    }

    /// Returns false when no account has that username.
    pub fn set_role(&self, username: &str, role: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE accounts SET role = ?2 WHERE username = ?1",
                params![username, role],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Characters --

    pub fn insert_character(&self, character: &CharacterRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO characters (id, owner_id, name, race, gender, appearance, stats, equipment, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    character.id,
                    character.owner_id,
                    character.name,
                    character.race,
                    character.gender,
                    character.appearance,
                    character.stats,
                    character.equipment,
                    character.created_at,
                    character.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    /// All characters of one owner, newest first.
    pub fn list_characters(&self, owner_id: &str) -> Result<Vec<CharacterRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CHARACTER_COLUMNS} FROM characters
                 WHERE owner_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner_id], character_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Fetch a character only if `owner_id` owns it.
    pub fn get_character(&self, id: &str, owner_id: &str) -> Result<Option<CharacterRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CHARACTER_COLUMNS} FROM characters WHERE id = ?1 AND owner_id = ?2"
            );
            let row = conn
                .query_row(&sql, params![id, owner_id], character_from_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Whether `owner_id` already has a character called `name`, ignoring
    /// `except_id` (the character being renamed).
    pub fn character_name_taken(
        &self,
        owner_id: &str,
        name: &str,
        except_id: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<String> = conn
                .query_row(
                    "SELECT id FROM characters
                     WHERE owner_id = ?1 AND name = ?2 AND (?3 IS NULL OR id != ?3)
                     LIMIT 1",
                    params![owner_id, name, except_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Overwrite a character's mutable fields. Scoped by owner; returns false
    /// when no row matched.
    pub fn update_character(&self, character: &CharacterRow) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE characters
                 SET name = ?3, race = ?4, gender = ?5, appearance = ?6, stats = ?7,
                     equipment = ?8, updated_at = ?9
                 WHERE id = ?1 AND owner_id = ?2",
                params![
                    character.id,
                    character.owner_id,
                    character.name,
                    character.race,
                    character.gender,
                    character.appearance,
                    character.stats,
                    character.equipment,
                    character.updated_at,
                ],
            )?;
            Ok(changed > 0)
        })
    }

    /// Delete a character only if `owner_id` owns it. Returns false when no
    /// row matched.
    pub fn delete_character(&self, id: &str, owner_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM characters WHERE id = ?1 AND owner_id = ?2",
                params![id, owner_id],
            )?;
            Ok(deleted > 0)
        })
    }
}

fn query_account(conn: &Connection, column: &str, value: &str) -> Result<Option<AccountRow>> {
    // `column` is always one of our own literals, never user input
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {column} = ?1");
    let row = conn
        .query_row(&sql, [value], |row| {
            Ok(AccountRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password_hash: row.get(3)?,
                role: row.get(4)?,
                created_at: row.get(5)?,
                last_login: row.get(6)?,
            })
        })
        .optional()?;
    Ok(row)
}

fn character_from_row(row: &Row<'_>) -> rusqlite::Result<CharacterRow> {
    Ok(CharacterRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        race: row.get(3)?,
        gender: row.get(4)?,
        appearance: row.get(5)?,
        stats: row.get(6)?,
        equipment: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
