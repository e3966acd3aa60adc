//! Error handling - RFC 7807 compliant responses.

use actix_web::{HttpRequest, HttpResponse, ResponseError, error::JsonPayloadError, http::StatusCode};

use yatube_core::error::{DomainError, RepoError};
use yatube_core::ports::AuthError;
use yatube_core::validation::{ValidationErrors, field_messages};
use yatube_shared::ErrorResponse;

use crate::observability::RequestId;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation errors: {0}")]
    Validation(ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// An extractor failure that already carries its own response.
    #[error("Rejected request: {0}")]
    Rejected(actix_web::Error),
}

impl AppError {
    fn to_problem(&self) -> ErrorResponse {
        match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Validation(errors) => ErrorResponse::new(400, "Validation Failed")
                .with_detail("Invalid input.")
                .with_errors(field_messages(errors)),
            AppError::Unauthorized(detail) => ErrorResponse::unauthorized(detail),
            AppError::Forbidden(detail) => ErrorResponse::forbidden(detail),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
            AppError::Rejected(err) => ErrorResponse::bad_request(err.to_string()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Rejected(err) => err.as_response_error().status_code(),
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Rejected(err) = self {
            return err.error_response();
        }

        let mut response = HttpResponse::build(self.status_code());
        if let AppError::Unauthorized(_) = self {
            response.insert_header(("WWW-Authenticate", "Bearer realm=\"api\""));
        }

        let mut problem = self.to_problem();
        if let Some(request_id) = RequestId::current() {
            problem = problem.with_request_id(request_id);
        }
        response.json(problem)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{entity_type} with id {id} not found"))
            }
            DomainError::Validation(errors) => AppError::Validation(errors),
            DomainError::AuthenticationRequired => AppError::Unauthorized(err.to_string()),
            DomainError::PermissionDenied => AppError::Forbidden(err.to_string()),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        DomainError::from(err).into()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => AppError::Unauthorized("Token is invalid or expired".into()),
            AuthError::InvalidToken(msg) => {
                tracing::debug!(reason = %msg, "Rejected token");
                AppError::Unauthorized("Token is invalid or expired".into())
            }
            AuthError::MissingAuth | AuthError::InvalidCredentials => {
                AppError::Unauthorized(err.to_string())
            }
            AuthError::HashingError(msg) => AppError::Internal(msg),
        }
    }
}

/// Render malformed or unreadable JSON bodies as problem details.
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, path = %req.path(), "Rejected JSON body");

    let mut problem = ErrorResponse::bad_request(format!("JSON parse error - {err}"));
    if let Some(request_id) = RequestId::current() {
        problem = problem.with_request_id(request_id);
    }

    actix_web::error::InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(problem),
    )
    .into()
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
