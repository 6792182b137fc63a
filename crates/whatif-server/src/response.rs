//! Error responses
//!
//! Every failure answers `{"error": "<message>"}` with a status derived from
//! the error kind.

use std::convert::Infallible;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::{Rejection, Reply};
use whatif_core::ScenarioError;

/// HTTP status for a pipeline error
#[must_use]
pub fn scenario_error_status(err: &ScenarioError) -> StatusCode {
    match err {
        ScenarioError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ScenarioError::NotFound(_) => StatusCode::NOT_FOUND,
        ScenarioError::NoFallbackMatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ScenarioError::MalformedCompletion { .. } => StatusCode::BAD_GATEWAY,
        ScenarioError::CompletionUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ScenarioError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `{"error": message}` with `status`
#[must_use]
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    reply::with_status(reply::json(&body), status).into_response()
}

/// Response for a pipeline error, logged by severity
#[must_use]
pub fn scenario_error_response(err: &ScenarioError) -> Response {
    let status = scenario_error_status(err);
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), "Request failed: {}", err);
    } else {
        tracing::warn!(status = status.as_u16(), "Request rejected: {}", err);
    }
    error_response(status, err.to_string())
}

/// Turn warp rejections into JSON error bodies
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("invalid request body: {e}"))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "request body too large".to_string())
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "content-length required".to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "expected application/json".to_string(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        tracing::error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error".to_string(),
        )
    };

    Ok(error_response(status, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use whatif_core::{CompletionError, ScenarioId, StoreError};

    #[test]
    fn status_per_error_kind() {
        let cases = [
            (ScenarioError::InvalidInput("empty".into()), 400),
            (ScenarioError::NotFound(ScenarioId(3)), 404),
            (
                ScenarioError::NoFallbackMatch {
                    user_input: "x".into(),
                },
                422,
            ),
            (ScenarioError::malformed("no object", "prose"), 502),
            (
                ScenarioError::CompletionUnavailable(CompletionError::EmptyResponse),
                503,
            ),
            (
                ScenarioError::Store(StoreError::io_error(
                    "/tmp/x",
                    std::io::Error::other("disk full"),
                )),
                500,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(scenario_error_status(&err).as_u16(), expected, "{err}");
        }
    }

    #[test]
    fn error_body_shape() {
        let response = error_response(StatusCode::NOT_FOUND, "scenario not found: 7");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
    }
}
