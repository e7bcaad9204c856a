use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::state::ErrorResponse;

pub fn json_error(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn json_error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
    .into_response()
}

/// Unix seconds as an RFC 3339 string; `None` for timestamps the `time`
/// crate cannot represent.
pub fn format_timestamp(secs: u64) -> Option<String> {
    let timestamp = i64::try_from(secs).ok()?;
    let datetime = OffsetDateTime::from_unix_timestamp(timestamp).ok()?;
    datetime.format(&Rfc3339).ok()
}

#[cfg(test)]
mod tests {
    use super::format_timestamp;

    #[test]
    fn formats_unix_seconds_as_rfc3339() {
        assert_eq!(
            format_timestamp(1_700_000_000).as_deref(),
            Some("2023-11-14T22:13:20Z")
        );
        assert_eq!(format_timestamp(0).as_deref(), Some("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn rejects_out_of_range_timestamps() {
        assert!(format_timestamp(u64::MAX).is_none());
    }
}
