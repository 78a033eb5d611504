use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the HTTP query and trigger interfaces.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Deliberately generic: no detail about why the secret failed to match.
    #[error("unauthorized")]
    Unauthorized,

    /// Server-side configuration error on the trigger interface.
    #[error("trigger secret is not configured")]
    SecretNotConfigured,

    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(Uuid),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::SecretNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UnknownEndpoint(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidDate(_) | ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(error) = self {
            tracing::error!("request failed: {error:#}");
        }

        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_error_taxonomy() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::SecretNotConfigured.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::UnknownEndpoint(Uuid::nil()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::InvalidDate("June".into()).status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unauthorized_body_leaks_no_detail() {
        assert_eq!(ApiError::Unauthorized.to_string(), "unauthorized");
    }
}
