use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::scheduler::SchedulerError;
use crate::state::{AppState, JsonResult, NextTrackResponse};
use crate::utils::json_error;

pub async fn next_track(State(state): State<AppState>) -> JsonResult<NextTrackResponse> {
    let scheduler = Arc::clone(&state.scheduler);
    let catalog = state.catalog.clone();

    let result = tokio::task::spawn_blocking(move || scheduler.select_next(&catalog))
        .await
        .map_err(|err| {
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("selection task failed: {}", err),
            )
        })?;

    let track = result.map_err(|err| match err {
        SchedulerError::EmptyCatalog => json_error(
            StatusCode::NOT_FOUND,
            "No tracks found. Please scan library first.",
        ),
        SchedulerError::TrackVanished => json_error(StatusCode::NOT_FOUND, "track not found"),
        other => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("selection failed: {}", other),
        ),
    })?;

    Ok(Json(NextTrackResponse::from_track(&track)))
}
