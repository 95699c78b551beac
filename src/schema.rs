//! Database schema management for `roomclimate`.
//!
//! Ensures the readings table and its index exist before serving requests.
//! Applied once on startup from `main.rs` when a database is configured.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create the database schema (idempotent).
///
/// Safe to call on every startup; no-op if objects already exist. Errors are
/// propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // One row per ingested payload, never updated
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS readings (
            id          BIGSERIAL PRIMARY KEY,
            device_id   TEXT  NOT NULL DEFAULT '',
            temperature JSONB,
            humidity    JSONB,
            room        TEXT  NOT NULL,
            recorded_at TEXT  NOT NULL,
            api_key     TEXT  NOT NULL DEFAULT ''
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_readings_room
            ON readings (room);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
