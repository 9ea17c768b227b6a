//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use modhub_domain::error::{ModHubError, ValidationError};
use modhub_domain::rule::{RuleConditionError, ValidationIssue};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    issues: Option<&'a [ValidationIssue]>,
}

/// Maps [`ModHubError`] and request-shape problems to an HTTP response.
pub enum ApiError {
    Domain(ModHubError),
    /// The request was well-formed JSON but not a usable definition.
    BadRequest(String),
}

impl ApiError {
    /// An identifier from the path that is not a valid id.
    pub fn invalid_id(kind: &'static str, value: &str) -> Self {
        Self::Domain(
            ValidationError::InvalidId {
                kind,
                value: value.to_string(),
            }
            .into(),
        )
    }
}

impl From<ModHubError> for ApiError {
    fn from(err: ModHubError) -> Self {
        Self::Domain(err)
    }
}

impl From<RuleConditionError> for ApiError {
    fn from(err: RuleConditionError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            Self::BadRequest(message) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorBody {
                        error: message,
                        issues: None,
                    }),
                )
                    .into_response();
            }
            Self::Domain(err) => err,
        };

        let (status, message) = match &err {
            ModHubError::Validation(inner) => (StatusCode::BAD_REQUEST, inner.to_string()),
            ModHubError::InvalidCondition(inner) => (StatusCode::BAD_REQUEST, inner.to_string()),
            ModHubError::NotFound(inner) => (StatusCode::NOT_FOUND, inner.to_string()),
            ModHubError::Storage(inner) => {
                tracing::error!(error = %inner, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        let issues = match &err {
            ModHubError::Validation(ValidationError::Rejected { issues }) => Some(issues.as_slice()),
            _ => None,
        };

        (status, Json(ErrorBody { error: message, issues })).into_response()
    }
}
