//! `roomclimate`: room climate telemetry service.
//!
//! Devices post temperature (and optionally humidity) readings; the service
//! stores them and serves three aggregated views: per-day stability, per-room
//! averages for a day, and a per-room time series for charting.
//!
//! This file re-exports the public surface used by the binaries and the
//! integration tests. Modules inside the crate import each other directly.
//! - `engine`  – pure grouping, classification and series reduction
//! - `reports` – store queries plus engine calls
//! - `store`   – PostgreSQL and in-memory reading stores
//! - `routes`  – axum subrouters merged into one app
pub mod config;
pub mod engine;
pub mod error;
pub mod keepalive;
pub mod logging;
pub mod models;
pub mod reports;
pub mod routes;
pub mod schema;
pub mod simulator;
pub mod store;

pub use config::Config;
pub use engine::{Aggregator, Metric, MetricSet, Thresholds};
pub use error::{ReportError, StoreError};
pub use models::{
    DataStability, DayReport, Measurement, MetricStability, Reading, RoomReport, SeriesReport,
    SeriesStats,
};
pub use reports::ReportService;
pub use routes::router;
pub use store::{MemoryReadingStore, PgReadingStore, ReadingStore};
