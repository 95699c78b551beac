//! Reporting service: one store round-trip per call, then pure aggregation.
//!
//! Nothing is cached. Every call re-fetches and re-aggregates, so repeated
//! queries against an unchanged store return identical reports. Store
//! failures are passed through untouched, with no retry and no partial result.

use tracing::{debug, instrument};

use crate::engine::{group_by_date, group_by_room, Aggregator};
use crate::error::{ReportError, StoreError};
use crate::models::{DayReport, Reading, RoomReport, SeriesReport};
use crate::store::ReadingStore;

// ---

#[derive(Debug, Clone)]
pub struct ReportService<S> {
    // ---
    store: S,
    engine: Aggregator,
}

impl<S: ReadingStore> ReportService<S> {
    // ---
    pub fn new(store: S, engine: Aggregator) -> Self {
        Self { store, engine }
    }

    pub fn engine(&self) -> &Aggregator {
        &self.engine
    }

    /// One stability summary per day present in the store, newest first.
    #[instrument(skip(self))]
    pub async fn list_date_reports(&self) -> Result<Vec<DayReport>, ReportError> {
        // ---
        let readings = self.store.find_all().await?;
        debug!("Aggregating {} readings by date", readings.len());

        Ok(group_by_date(readings)?
            .into_iter()
            .map(|(date, day)| self.engine.day_report(date, &day))
            .collect())
    }

    /// One report per room seen on `date`, in order of first appearance.
    #[instrument(skip(self))]
    pub async fn list_room_reports(&self, date: &str) -> Result<Vec<RoomReport>, ReportError> {
        // ---
        let readings = self.store.find_by_date(date).await?;
        debug!("Aggregating {} readings by room", readings.len());

        Ok(group_by_room(readings)
            .into_iter()
            .map(|(room, group)| self.engine.room_report(&room, date, &group))
            .collect())
    }

    /// Time series for a single room on `date`.
    #[instrument(skip(self))]
    pub async fn get_series_report(
        &self,
        date: &str,
        room: &str,
    ) -> Result<SeriesReport, ReportError> {
        // ---
        let readings = self.store.find_by_date_and_room(date, room).await?;
        debug!("Building series from {} readings", readings.len());

        self.engine.build_series(&readings, date, room)
    }

    /// Append a reading exactly as received.
    #[instrument(skip(self, reading), fields(device = %reading.device_id, room = %reading.room))]
    pub async fn ingest(&self, reading: Reading) -> Result<(), StoreError> {
        self.store.insert(reading).await
    }
}
