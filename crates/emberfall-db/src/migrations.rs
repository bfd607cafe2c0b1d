use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (accounts, characters)");
        conn.execute_batch(
            "
            CREATE TABLE accounts (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT UNIQUE,
                password_hash   TEXT NOT NULL,
                role            TEXT NOT NULL DEFAULT 'user',
                created_at      TEXT NOT NULL,
                last_login      TEXT
            );

            CREATE TABLE characters (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL REFERENCES accounts(id),
                name        TEXT NOT NULL,
                race        TEXT NOT NULL,
                gender      TEXT NOT NULL,
                appearance  TEXT NOT NULL DEFAULT '{}',
                stats       TEXT NOT NULL,
                equipment   TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                UNIQUE(owner_id, name)
            );

            CREATE INDEX idx_characters_owner
                ON characters(owner_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
