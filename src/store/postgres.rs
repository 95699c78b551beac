//! PostgreSQL-backed reading store.
//!
//! Temperature and humidity are kept as JSONB so whatever the device sent
//! (number, null, garbage) survives the round trip unchanged.

use sqlx::types::Json;
use sqlx::PgPool;

use super::ReadingStore;
use crate::error::StoreError;
use crate::models::{Measurement, Reading};

// ---

#[derive(Debug, Clone)]
pub struct PgReadingStore {
    // ---
    pool: PgPool,
}

impl PgReadingStore {
    // ---
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row shape of the `readings` table.
#[derive(Debug, sqlx::FromRow)]
struct ReadingRow {
    // ---
    device_id: String,
    temperature: Option<Json<Measurement>>,
    humidity: Option<Json<Measurement>>,
    room: String,
    recorded_at: String,
    api_key: String,
}

impl From<ReadingRow> for Reading {
    fn from(row: ReadingRow) -> Self {
        // ---
        Reading {
            device_id: row.device_id,
            temperature: row.temperature.map(|j| j.0).unwrap_or_default(),
            humidity: row.humidity.map(|j| j.0).unwrap_or_default(),
            room: row.room,
            timestamp: row.recorded_at,
            api_key: row.api_key,
        }
    }
}

impl ReadingStore for PgReadingStore {
    // ---
    async fn find_all(&self) -> Result<Vec<Reading>, StoreError> {
        // ---
        let rows: Vec<ReadingRow> = sqlx::query_as(
            r#"
            SELECT device_id, temperature, humidity, room, recorded_at, api_key
            FROM readings
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!("find_all returned {} readings", rows.len());
        Ok(rows.into_iter().map(Reading::from).collect())
    }

    async fn find_by_date(&self, date: &str) -> Result<Vec<Reading>, StoreError> {
        // ---
        let rows: Vec<ReadingRow> = sqlx::query_as(
            r#"
            SELECT device_id, temperature, humidity, room, recorded_at, api_key
            FROM readings
            WHERE strpos(recorded_at, $1) > 0
            ORDER BY id
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!("find_by_date({}) returned {} readings", date, rows.len());
        Ok(rows.into_iter().map(Reading::from).collect())
    }

    async fn find_by_date_and_room(
        &self,
        date: &str,
        room: &str,
    ) -> Result<Vec<Reading>, StoreError> {
        // ---
        let rows: Vec<ReadingRow> = sqlx::query_as(
            r#"
            SELECT device_id, temperature, humidity, room, recorded_at, api_key
            FROM readings
            WHERE strpos(recorded_at, $1) > 0
              AND room = $2
            ORDER BY id
            "#,
        )
        .bind(date)
        .bind(room)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(
            "find_by_date_and_room({}, {}) returned {} readings",
            date,
            room,
            rows.len()
        );
        Ok(rows.into_iter().map(Reading::from).collect())
    }

    async fn insert(&self, reading: Reading) -> Result<(), StoreError> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO readings (
                device_id, temperature, humidity, room, recorded_at, api_key
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&reading.device_id)
        .bind(Json(&reading.temperature))
        .bind(Json(&reading.humidity))
        .bind(&reading.room)
        .bind(&reading.timestamp)
        .bind(&reading.api_key)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
