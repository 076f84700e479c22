//! Mapping of failures onto HTTP responses.

use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::error::RiverdaleError;
use crate::ratelimit::Decision;

/// An error returned from a request handler.
#[derive(Debug)]
pub enum ApiError {
    /// The request body is malformed or fails validation
    BadRequest(String),
    /// The client used up its quota for this endpoint
    RateLimited {
        decision: Decision,
        retry_after_secs: u64,
    },
    /// Anything the client cannot fix
    Internal,
}

impl From<RiverdaleError> for ApiError {
    fn from(err: RiverdaleError) -> Self {
        match err {
            RiverdaleError::InvalidArgument(message) => ApiError::BadRequest(message),
            other => {
                error!(error = %other, "Request failed");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::RateLimited {
                decision,
                retry_after_secs,
            } => {
                let mut headers = rate_limit_headers(&decision);
                headers.insert("retry-after", HeaderValue::from(retry_after_secs));
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    headers,
                    Json(json!({
                        "error": "Too many requests",
                        "retry_after": retry_after_secs,
                    })),
                )
                    .into_response()
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response(),
        }
    }
}

/// `X-RateLimit-Remaining` and `X-RateLimit-Reset` (epoch seconds) for a decision.
pub fn rate_limit_headers(decision: &Decision) -> HeaderMap {
    let reset_secs = decision.reset_at.saturating_add(999) / 1000;

    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(reset_secs));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_headers() {
        let decision = Decision {
            ok: true,
            remaining: 3,
            reset_at: 1_700_000_000_001,
        };
        let headers = rate_limit_headers(&decision);
        assert_eq!(headers["x-ratelimit-remaining"], "3");
        assert_eq!(headers["x-ratelimit-reset"], "1700000001");
    }

    #[test]
    fn test_rate_limited_response() {
        let response = ApiError::RateLimited {
            decision: Decision {
                ok: false,
                remaining: 0,
                reset_at: 5_000,
            },
            retry_after_secs: 4,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "4");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    }

    #[test]
    fn test_error_mapping() {
        let bad = ApiError::from(RiverdaleError::InvalidArgument("nope".to_string()));
        assert!(matches!(bad, ApiError::BadRequest(ref m) if m == "nope"));

        let internal = ApiError::from(RiverdaleError::Store("down".to_string()));
        assert_eq!(
            internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
