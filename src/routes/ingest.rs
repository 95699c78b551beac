//! Device ingestion endpoint.
//!
//! Payloads are appended unchanged. Shape errors (missing `room` or
//! `timestamp`, bad JSON) are rejected by the `Json` extractor before the
//! handler runs; everything else is the store's business.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use serde_json::json;
use tracing::{debug, error, info};

use super::AppState;
use crate::{Reading, ReadingStore};

// ---

pub fn router<S: ReadingStore>() -> Router<AppState<S>> {
    // ---
    Router::new().route("/api/iot/readings", post(handler::<S>))
}

async fn handler<S: ReadingStore>(
    State((service, config)): State<AppState<S>>,
    Json(reading): Json<Reading>,
) -> impl IntoResponse {
    // ---
    if config.log_ingest_payloads {
        info!("New reading: {:?}", reading);
    } else {
        debug!("New reading from {} in {}", reading.device_id, reading.room);
    }

    match service.ingest(reading).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            error!("Failed to store reading: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}
