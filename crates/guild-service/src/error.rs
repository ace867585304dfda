//! API error types and responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use guild_core::{ForumError, IdError};
use guild_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No session credential was presented.
    #[error("not authorized")]
    MissingCredentials,

    /// The session credential is malformed, forged, or expired.
    #[error("unauthorized")]
    InvalidCredentials,

    /// Authenticated, but not allowed to act on this resource.
    #[error("forbidden access")]
    Forbidden(Option<String>),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists or invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store could not serve the call.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The store call did not finish in time.
    #[error("timed out")]
    Timeout,

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::MissingCredentials | Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                self.to_string(),
                None,
            ),
            Self::Forbidden(reason) => (
                StatusCode::FORBIDDEN,
                "forbidden",
                self.to_string(),
                reason
                    .as_ref()
                    .map(|r| serde_json::json!({ "reason": r })),
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::Unavailable(msg) => {
                tracing::error!(error = %msg, "Store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable",
                    "The service is temporarily unavailable".to_string(),
                    None,
                )
            }
            Self::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "timeout",
                "The request timed out".to_string(),
                None,
            ),
            Self::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                "external_service_error",
                msg.clone(),
                None,
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ForumError> for ApiError {
    fn from(err: ForumError) -> Self {
        match err {
            ForumError::InvalidArgument(msg) => Self::BadRequest(msg),
            ForumError::InvalidId(id) => Self::BadRequest(id.to_string()),
            ForumError::NotFound { entity, id } => Self::NotFound(format!("{entity} not found: {id}")),
            ForumError::Conflict(msg) => Self::Conflict(msg),
            ForumError::Forbidden(msg) => Self::Forbidden(Some(msg)),
        }
    }
}

impl From<IdError> for ApiError {
    fn from(err: IdError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(domain) => domain.into(),
            StoreError::Database(msg)
            | StoreError::Busy(msg)
            | StoreError::Serialization(msg) => Self::Unavailable(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_keep_their_kind() {
        let conflict: ApiError = StoreError::Domain(ForumError::Conflict("dup".into())).into();
        assert!(matches!(conflict, ApiError::Conflict(msg) if msg == "dup"));

        let forbidden: ApiError = ForumError::Forbidden("owner only".into()).into();
        assert_eq!(forbidden.into_response().status(), StatusCode::FORBIDDEN);

        let missing: ApiError = ForumError::not_found("post", "abc").into();
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn io_errors_hide_detail() {
        let err: ApiError = StoreError::Database("sst corrupted".into()).into();
        assert!(matches!(err, ApiError::Unavailable(_)));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn credential_messages() {
        assert_eq!(ApiError::MissingCredentials.to_string(), "not authorized");
        assert_eq!(ApiError::InvalidCredentials.to_string(), "unauthorized");
        assert_eq!(ApiError::Forbidden(None).to_string(), "forbidden access");
    }
}
