use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    Json,
};
use catalog::CatalogError;

use crate::state::{AppState, JsonResult, RatingResponse, TrackResponse};
use crate::utils::json_error;

pub async fn list_tracks(State(state): State<AppState>) -> JsonResult<Vec<TrackResponse>> {
    let tracks = state.catalog.list().map_err(catalog_error)?;
    let items = tracks.iter().map(TrackResponse::from_track).collect();
    Ok(Json(items))
}

pub async fn like_track(
    State(state): State<AppState>,
    AxumPath(track_id): AxumPath<String>,
) -> JsonResult<RatingResponse> {
    adjust_rating(&state, &track_id, 1, "like")
}

pub async fn dislike_track(
    State(state): State<AppState>,
    AxumPath(track_id): AxumPath<String>,
) -> JsonResult<RatingResponse> {
    adjust_rating(&state, &track_id, -1, "dislike")
}

fn adjust_rating(
    state: &AppState,
    track_id: &str,
    delta: i32,
    action: &'static str,
) -> JsonResult<RatingResponse> {
    let track = state
        .catalog
        .adjust_rating(track_id, delta)
        .map_err(catalog_error)?
        .ok_or_else(|| json_error(StatusCode::NOT_FOUND, "track not found"))?;

    Ok(Json(RatingResponse {
        id: track.id,
        rating: track.rating,
        action,
    }))
}

fn catalog_error(err: CatalogError) -> (StatusCode, Json<crate::state::ErrorResponse>) {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("catalog error: {}", err),
    )
}
