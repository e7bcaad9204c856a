use std::path::Path;

use axum::{
    body::Body,
    extract::{Path as AxumPath, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};

use crate::range::{parse_range_header, RangeError};
use crate::state::AppState;
use crate::stream::{byte_stream, open_audio, slice_stream};
use crate::utils::json_error_response;

const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";
const DURATION_HEADER: &str = "X-Content-Duration";

pub async fn stream_track(
    State(state): State<AppState>,
    AxumPath(track_id): AxumPath<String>,
    headers: HeaderMap,
) -> Response {
    let track = match state.catalog.get(&track_id) {
        Ok(Some(track)) => track,
        Ok(None) => return json_error_response(StatusCode::NOT_FOUND, "track not found"),
        Err(err) => {
            return json_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("catalog error: {}", err),
            )
        }
    };

    // The open doubles as the existence check; the catalog entry may have
    // gone stale since the last scan.
    let source = match open_audio(Path::new(&track.file_path)).await {
        Ok(source) => source,
        Err(_) => return json_error_response(StatusCode::NOT_FOUND, "file not found on disk"),
    };
    let size = source.size;

    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .map(|value| parse_range_header(value, size));

    match range {
        Some(Ok(range)) => {
            let stream = match slice_stream(source.file, range.start, range.len()).await {
                Ok(stream) => stream,
                Err(err) => {
                    return json_error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("seek failed: {}", err),
                    )
                }
            };
            let mut response = Response::new(Body::from_stream(stream));
            *response.status_mut() = StatusCode::PARTIAL_CONTENT;
            apply_common_headers(&mut response, track.duration_secs);
            insert_header(
                &mut response,
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", range.start, range.end, size),
            );
            insert_header(
                &mut response,
                header::CONTENT_LENGTH,
                range.len().to_string(),
            );
            response
        }
        Some(Err(RangeError::Unsatisfiable)) => {
            let mut response =
                json_error_response(StatusCode::RANGE_NOT_SATISFIABLE, "range not satisfiable");
            insert_header(&mut response, header::ACCEPT_RANGES, "bytes".to_string());
            insert_header(
                &mut response,
                header::CONTENT_RANGE,
                format!("bytes */{}", size),
            );
            response
        }
        // Malformed Range values are ignored; the client gets the full file.
        Some(Err(RangeError::Invalid)) | None => {
            let mut response = Response::new(Body::from_stream(byte_stream(source.file, size)));
            apply_common_headers(&mut response, track.duration_secs);
            insert_header(&mut response, header::CONTENT_LENGTH, size.to_string());
            response
        }
    }
}

fn apply_common_headers(response: &mut Response, duration_secs: Option<u64>) {
    insert_header(response, header::ACCEPT_RANGES, "bytes".to_string());
    insert_header(
        response,
        header::CONTENT_TYPE,
        AUDIO_CONTENT_TYPE.to_string(),
    );
    if let Some(duration) = duration_secs {
        if let Ok(value) = HeaderValue::from_str(&duration.to_string()) {
            response.headers_mut().insert(DURATION_HEADER, value);
        }
    }
}

fn insert_header(response: &mut Response, name: header::HeaderName, value: String) {
    if let Ok(value) = HeaderValue::from_str(&value) {
        response.headers_mut().insert(name, value);
    }
}
