//! HTTP error mapping for core errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nestfund_core::errors::{DatabaseError, Error};
use serde_json::json;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Wrapper turning core errors into HTTP responses.
///
/// Conflicts (including exhausted retries) map to 409 so clients re-fetch
/// before resubmitting; validation failures map to 422 and carry the reason.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::Conflict(_) | Error::StaleState(_) => StatusCode::CONFLICT,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound(_) | Error::Database(DatabaseError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Unhandled error: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestfund_core::errors::ValidationError;

    #[test]
    fn test_status_mapping() {
        let conflict = ApiError(Error::Conflict("head moved".to_string()));
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        let stale = ApiError(Error::StaleState("retries exhausted".to_string()));
        assert_eq!(stale.status_code(), StatusCode::CONFLICT);

        let validation = ApiError(Error::Validation(ValidationError::AmountSign {
            action_type: "CONTRIBUTION".to_string(),
            amount: -5,
        }));
        assert_eq!(validation.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let missing = ApiError(Error::Database(DatabaseError::NotFound(
            "goal".to_string(),
        )));
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let db = ApiError(Error::Database(DatabaseError::QueryFailed(
            "locked".to_string(),
        )));
        assert_eq!(db.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
