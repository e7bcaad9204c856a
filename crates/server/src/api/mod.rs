pub mod player;
pub mod stream;
pub mod tracks;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::state::{AppState, InfoResponse, JsonResult, RootResponse, ScanResponse, SERVER_NAME};
use crate::sync;
use crate::utils::json_error;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/scan", post(scan_library))
        .route("/api/tracks", get(tracks::list_tracks))
        .route("/api/stream/:track_id", get(stream::stream_track))
        .route("/api/next", get(player::next_track))
        .route("/api/tracks/:track_id/like", post(tracks::like_track))
        .route("/api/tracks/:track_id/dislike", post(tracks::dislike_track))
        .route("/api/info", get(info))
        .with_state(state)
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: SERVER_NAME,
    })
}

async fn scan_library(State(state): State<AppState>) -> JsonResult<ScanResponse> {
    let catalog = state.catalog.clone();
    let root = state.music_root.clone();
    let report = tokio::task::spawn_blocking(move || sync::sync_library(&catalog, &root))
        .await
        .map_err(|err| {
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("scan task failed: {}", err),
            )
        })?
        .map_err(|err| {
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("scan failed: {}", err),
            )
        })?;

    Ok(Json(ScanResponse {
        status: "scan completed",
        added: report.added,
        removed: report.removed,
    }))
}

async fn info(State(state): State<AppState>) -> JsonResult<InfoResponse> {
    let count = state.catalog.count().map_err(|err| {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("catalog error: {}", err),
        )
    })?;
    Ok(Json(InfoResponse {
        tracks_count: count,
    }))
}
