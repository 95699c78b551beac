//! Report endpoints: date list, room list per date, series per room.
//!
//! Any failure (store down, malformed stored timestamp) is logged and turned
//! into a generic 500; no partial report is ever served.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::{debug, error, info};

use super::AppState;
use crate::{ReadingStore, ReportError};

// ---

pub fn router<S: ReadingStore>() -> Router<AppState<S>> {
    // ---
    Router::new()
        .route("/api/reports/dates", get(list_dates::<S>))
        .route("/api/reports/dates/{date}/rooms", get(list_rooms::<S>))
        .route("/api/reports/dates/{date}/rooms/{room}", get(series::<S>))
}

async fn list_dates<S: ReadingStore>(
    State((service, _config)): State<AppState<S>>,
) -> Response {
    // ---
    info!("GET /api/reports/dates");

    match service.list_date_reports().await {
        Ok(days) => {
            debug!("GET /api/reports/dates - {} days", days.len());
            (StatusCode::OK, Json(days)).into_response()
        }
        Err(e) => failure("date list", e),
    }
}

async fn list_rooms<S: ReadingStore>(
    Path(date): Path<String>,
    State((service, _config)): State<AppState<S>>,
) -> Response {
    // ---
    info!("GET /api/reports/dates/{}/rooms", date);

    match service.list_room_reports(&date).await {
        Ok(rooms) => {
            debug!("GET /api/reports/dates/{}/rooms - {} rooms", date, rooms.len());
            (StatusCode::OK, Json(rooms)).into_response()
        }
        Err(e) => failure("room list", e),
    }
}

async fn series<S: ReadingStore>(
    Path((date, room)): Path<(String, String)>,
    State((service, _config)): State<AppState<S>>,
) -> Response {
    // ---
    info!("GET /api/reports/dates/{}/rooms/{}", date, room);

    match service.get_series_report(&date, &room).await {
        Ok(report) => {
            debug!("Series has {} samples", report.labels.len());
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => failure("series", e),
    }
}

fn failure(report: &str, e: ReportError) -> Response {
    // ---
    error!("Failed to build {} report: {}", report, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Failed to build report" })),
    )
        .into_response()
}
