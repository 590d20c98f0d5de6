use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use serde::Serialize;

use crate::store::StoreError;

pub async fn handler404(path: Uri) -> Error {
    Error::NotFound {
        message: format!("Invalid path: {}", path),
    }
}

/// Body of every failed request: `{"error": "<message>"}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    error: String,
}

/// Body of mutations that return nothing but an acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct Success {
    success: bool,
}

impl Success {
    pub fn new() -> Self {
        Self { success: true }
    }
}

impl Default for Success {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub enum Error {
    NotFound { message: String },
    Forbidden { message: String },
    AuthenticationFailure { message: String },
    InvalidPayload { message: String },
    UserAlreadyExists { message: String },
    InternalError { kind: &'static str, message: String },
}

impl Error {
    pub fn not_found(entity: &str) -> Error {
        Error::NotFound {
            message: format!("{} not found", entity),
        }
    }

    pub fn forbidden<S: Into<String>>(msg: S) -> Error {
        Error::Forbidden {
            message: msg.into(),
        }
    }

    pub fn invalid<S: Into<String>>(msg: S) -> Error {
        Error::InvalidPayload {
            message: msg.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::AuthenticationFailure { .. } => StatusCode::UNAUTHORIZED,
            Error::InvalidPayload { .. } | Error::UserAlreadyExists { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::NotFound { message }
            | Error::Forbidden { message }
            | Error::AuthenticationFailure { message }
            | Error::InvalidPayload { message }
            | Error::UserAlreadyExists { message }
            | Error::InternalError { message, .. } => message,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Error::InternalError { kind, message } = &self {
            log::error!("{}: {}", kind, message);
        }
        let body = ErrorBody {
            error: self.message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<uuid::Error> for Error {
    fn from(id: uuid::Error) -> Self {
        Self::InternalError {
            kind: "UUIDError",
            message: id.to_string(),
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => Error::not_found(entity),
            StoreError::Conflict(message) => Self::UserAlreadyExists { message },
            StoreError::Unexpected(err) => Self::InternalError {
                kind: "DatabaseError",
                message: err.to_string(),
            },
        }
    }
}

impl From<pbkdf2::password_hash::Error> for Error {
    fn from(err: pbkdf2::password_hash::Error) -> Self {
        Self::InternalError {
            kind: "HashError",
            message: err.to_string(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::InternalError {
            kind: "TokenError",
            message: err.to_string(),
        }
    }
}
