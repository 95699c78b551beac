//! HTTP routes gateway.
//!
//! Each sibling module exports a subrouter; this gateway merges them and
//! attaches the shared state so `main.rs` never sees individual endpoints.
use axum::Router;

use crate::{Config, ReadingStore, ReportService};

pub(crate) mod health;
mod ingest;
mod reports;

// ---

/// State shared by every handler.
pub type AppState<S> = (ReportService<S>, Config);

pub fn router<S: ReadingStore>(service: ReportService<S>, config: Config) -> Router {
    // ---
    Router::new()
        .merge(reports::router())
        .merge(ingest::router())
        .merge(health::router())
        .with_state((service, config))
}
