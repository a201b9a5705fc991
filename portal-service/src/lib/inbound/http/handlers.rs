use axum::http::header::InvalidHeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::account::errors::AccountError;
use crate::domain::session::errors::SessionStoreError;

pub mod change_password;
pub mod csrf_token;
pub mod login;
pub mod logout;
pub mod me;
pub mod password_reset;
pub mod register;
pub mod verify;

/// Message shown whenever an anti-forgery check or logout key check fails.
pub const SESSION_EXPIRED_MESSAGE: &str =
    "Your session has expired. Please try redoing what you were trying to do.";

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
}

impl ApiError {
    pub fn session_expired() -> Self {
        ApiError::Forbidden(SESSION_EXPIRED_MESSAGE.to_string())
    }

    fn internal() -> Self {
        ApiError::InternalServerError(
            "An error occurred. Please try again later.".to_string(),
        )
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!(error = %e, "Unexpected error");
        Self::internal()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidUserId(_)
            | AccountError::InvalidUsername(_)
            | AccountError::InvalidEmail(_)
            | AccountError::WeakPassword(_)
            | AccountError::ReservedUsername => ApiError::UnprocessableEntity(err.to_string()),
            AccountError::UnknownUser | AccountError::ResetKeyNotFound => {
                ApiError::NotFound(err.to_string())
            }
            AccountError::WrongPassword => ApiError::BadRequest(err.to_string()),
            AccountError::ResetRequired
            | AccountError::PendingVerification(_)
            | AccountError::Banned
            | AccountError::RegistrationClosed => ApiError::Forbidden(err.to_string()),
            AccountError::UsernameTaken
            | AccountError::EmailTaken
            | AccountError::UsernameInHistory => ApiError::Conflict(err.to_string()),
            AccountError::Password(_)
            | AccountError::TokenGeneration(_)
            | AccountError::StoreUnavailable(_) => {
                tracing::error!(error = %err, "Account operation failed");
                ApiError::internal()
            }
        }
    }
}

impl From<SessionStoreError> for ApiError {
    fn from(err: SessionStoreError) -> Self {
        tracing::error!(error = %err, "Session store operation failed");
        ApiError::internal()
    }
}

impl From<auth::CsrfError> for ApiError {
    fn from(err: auth::CsrfError) -> Self {
        tracing::error!(error = %err, "Failed to issue CSRF token");
        ApiError::internal()
    }
}

impl From<InvalidHeaderValue> for ApiError {
    fn from(err: InvalidHeaderValue) -> Self {
        tracing::error!(error = %err, "Failed to build cookie header");
        ApiError::internal()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

/// Plain acknowledgement payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageData {
    pub message: String,
}

impl MessageData {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
