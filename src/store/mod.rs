//! Reading store gateway.
//!
//! The reporting service only needs four capabilities from persistence: a
//! full scan, a scan filtered by a timestamp substring, the same filtered by
//! exact room, and an append. Results come back in insertion order.

use std::future::Future;

use crate::error::StoreError;
use crate::models::Reading;

mod memory;
mod postgres;

pub use memory::MemoryReadingStore;
pub use postgres::PgReadingStore;

// ---

/// Append-only collection of readings.
pub trait ReadingStore: Clone + Send + Sync + 'static {
    // ---
    /// Every stored reading.
    fn find_all(&self) -> impl Future<Output = Result<Vec<Reading>, StoreError>> + Send;

    /// Readings whose timestamp contains `date`.
    fn find_by_date(
        &self,
        date: &str,
    ) -> impl Future<Output = Result<Vec<Reading>, StoreError>> + Send;

    /// Readings whose timestamp contains `date` and whose room is exactly `room`.
    fn find_by_date_and_room(
        &self,
        date: &str,
        room: &str,
    ) -> impl Future<Output = Result<Vec<Reading>, StoreError>> + Send;

    /// Append one reading as-is.
    fn insert(&self, reading: Reading) -> impl Future<Output = Result<(), StoreError>> + Send;
}
