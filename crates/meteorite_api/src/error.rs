//! API error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use meteorite_core::{PageError, RepoError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Body text for every 500; the cause is only logged.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

/// Error body for every non-404 failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

#[derive(Debug)]
pub enum ApiError {
    /// Rendered as a bare 404 with an empty body.
    NotFound,
    BadRequest(String),
    /// Carries the cause for the server log, never for the client.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::BadRequest(message) => write!(f, "bad request: {message}"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<PageError> for ApiError {
    fn from(value: PageError) -> Self {
        Self::BadRequest(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::NotFound => return status.into_response(),
            Self::BadRequest(message) => message,
            Self::Internal(detail) => {
                error!(
                    "event=http_error module=api status=error code={} error={}",
                    status.as_u16(),
                    detail
                );
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };
        (
            status,
            Json(ErrorResponse {
                error: message,
                code: status.as_u16(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiError, ErrorResponse, INTERNAL_ERROR_MESSAGE};
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use meteorite_core::RepoError;

    async fn render(error: ApiError) -> (StatusCode, Vec<u8>) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn store_failure_hides_cause_from_client() {
        let cause = RepoError::InvalidData("no such column: secret_column".to_string());
        let (status, body) = render(ApiError::from(cause)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.error, INTERNAL_ERROR_MESSAGE);
        assert_eq!(body.code, 500);
    }

    #[tokio::test]
    async fn not_found_has_empty_body() {
        let (status, body) = render(ApiError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn bad_request_keeps_message() {
        let (status, body) =
            render(ApiError::BadRequest("unknown sort property `x`".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.error, "unknown sort property `x`");
        assert_eq!(body.code, 400);
    }
}
