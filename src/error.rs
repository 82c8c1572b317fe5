//! Unified error type spanning the scan, reconciliation, persistence and
//! HTTP layers, plus its JSON response mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Unexpected failure; details stay server-side, the client gets an
    /// opaque error id to quote.
    Internal(anyhow::Error),
    /// Malformed or unsatisfiable request.
    BadRequest(String),
    NotFound(String),
    /// The request races the server state, e.g. triggering a scan for a
    /// partition that is already being scanned.
    Conflict(String),
    Database(String),
    /// Request parameter failed validation.
    InvalidInput(String),
    /// A scan pass failed as a whole (walker panic, storage rejection).
    Scanner(String),
    IoError(String),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Scanner(_) => "SCANNER_ERROR",
            AppError::IoError(_) => "IO_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(e) => write!(f, "Internal error: {}", e),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::Scanner(msg) => write!(f, "Scanner error: {}", msg),
            AppError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Internal(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        // Public message and optional details; internal/storage failures
        // are logged in full but reported opaquely.
        let (message, details): (String, Option<Value>) = match self {
            AppError::Internal(e) => {
                let error_id = uuid::Uuid::new_v4();
                tracing::error!("Internal error {}: {:?}", error_id, e);
                (
                    "An internal server error occurred".to_string(),
                    Some(json!({ "error_id": error_id.to_string() })),
                )
            }
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                ("A database error occurred".to_string(), Some(json!({ "details": msg })))
            }
            AppError::IoError(msg) => {
                tracing::error!("I/O error: {}", msg);
                ("An I/O error occurred".to_string(), Some(json!({ "details": msg })))
            }
            AppError::Scanner(msg) => {
                tracing::warn!("Scanner error: {}", msg);
                (msg, None)
            }
            AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::InvalidInput(msg) => (msg, None),
        };

        let mut body = json!({
            "error": {
                "code": code,
                "message": message,
            },
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let Some(details) = details {
            body["error"]["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => AppError::Database(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => {
                AppError::Database("Database connection pool timed out".to_string())
            }
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(format!("{}: {}", err.kind(), err))
    }
}

impl From<globset::Error> for AppError {
    fn from(err: globset::Error) -> Self {
        AppError::InvalidInput(format!("Invalid wildcard pattern: {}", err))
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::InvalidInput(format!("Invalid regex pattern: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Converts `Option<T>` into `AppResult<T>`, naming the missing entity.
pub trait OptionExt<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(format!("{} not found", entity)))
    }
}

pub mod validation {
    use super::*;

    /// Rejects empty paths and paths containing null characters.
    pub fn validate_path(path: &str) -> AppResult<()> {
        if path.is_empty() {
            return Err(AppError::InvalidInput("Path cannot be empty".to_string()));
        }
        if path.contains('\0') {
            return Err(AppError::InvalidInput("Path contains null characters".to_string()));
        }
        Ok(())
    }
}
