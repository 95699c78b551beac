//! In-process reading store, used when no database is configured and in tests.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::ReadingStore;
use crate::error::StoreError;
use crate::models::Reading;

// ---

#[derive(Debug, Clone, Default)]
pub struct MemoryReadingStore {
    // ---
    readings: Arc<RwLock<Vec<Reading>>>,
}

impl MemoryReadingStore {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `readings`, kept in the given order.
    pub fn with_readings(readings: Vec<Reading>) -> Self {
        Self {
            readings: Arc::new(RwLock::new(readings)),
        }
    }

    async fn filtered<F>(&self, keep: F) -> Vec<Reading>
    where
        F: Fn(&Reading) -> bool,
    {
        // ---
        self.readings
            .read()
            .await
            .iter()
            .filter(|&r| keep(r))
            .cloned()
            .collect()
    }
}

impl ReadingStore for MemoryReadingStore {
    // ---
    async fn find_all(&self) -> Result<Vec<Reading>, StoreError> {
        Ok(self.readings.read().await.clone())
    }

    async fn find_by_date(&self, date: &str) -> Result<Vec<Reading>, StoreError> {
        Ok(self.filtered(|r| r.timestamp.contains(date)).await)
    }

    async fn find_by_date_and_room(
        &self,
        date: &str,
        room: &str,
    ) -> Result<Vec<Reading>, StoreError> {
        Ok(self
            .filtered(|r| r.timestamp.contains(date) && r.room == room)
            .await)
    }

    async fn insert(&self, reading: Reading) -> Result<(), StoreError> {
        // ---
        self.readings.write().await.push(reading);
        Ok(())
    }
}
