use std::path::PathBuf;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::Json;
use catalog::{CatalogStore, Track};
use serde::Serialize;

use crate::scheduler::Scheduler;
use crate::utils::format_timestamp;

pub const SERVER_NAME: &str = "homefm";

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogStore,
    pub scheduler: Arc<Scheduler>,
    pub music_root: PathBuf,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct ScanResponse {
    pub status: &'static str,
    pub added: usize,
    pub removed: usize,
}

#[derive(Serialize)]
pub struct InfoResponse {
    pub tracks_count: u64,
}

#[derive(Serialize)]
pub struct TrackResponse {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub file_path: String,
    pub duration: Option<u64>,
    pub rating: i32,
    pub play_count: u64,
    pub last_played: Option<String>,
    pub created_at: Option<String>,
}

impl TrackResponse {
    pub fn from_track(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            file_path: track.file_path.clone(),
            duration: track.duration_secs,
            rating: track.rating,
            play_count: track.play_count,
            last_played: track.last_played.and_then(format_timestamp),
            created_at: format_timestamp(track.created_at),
        }
    }
}

#[derive(Serialize)]
pub struct NextTrackResponse {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub duration: Option<u64>,
    pub play_count: u64,
    pub last_played: Option<String>,
    pub rating: i32,
}

impl NextTrackResponse {
    pub fn from_track(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            duration: track.duration_secs,
            play_count: track.play_count,
            last_played: track.last_played.and_then(format_timestamp),
            rating: track.rating,
        }
    }
}

#[derive(Serialize)]
pub struct RatingResponse {
    pub id: String,
    pub rating: i32,
    pub action: &'static str,
}

pub type JsonResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[cfg(test)]
mod tests {
    use super::NextTrackResponse;
    use catalog::Track;

    #[test]
    fn next_track_response_serializes_timestamp_or_null() {
        let mut track = Track {
            id: "abc".to_string(),
            title: "Song".to_string(),
            artist: "Band".to_string(),
            file_path: "/music/a.mp3".to_string(),
            duration_secs: Some(240),
            rating: -2,
            play_count: 5,
            last_played: None,
            created_at: 1_700_000_000,
        };

        let value = serde_json::to_value(NextTrackResponse::from_track(&track)).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["duration"], 240);
        assert!(value["last_played"].is_null());

        track.last_played = Some(1_700_000_000);
        let value = serde_json::to_value(NextTrackResponse::from_track(&track)).unwrap();
        assert_eq!(value["last_played"], "2023-11-14T22:13:20Z");
    }
}
