//! Unified error handling for the attribute engine
//!
//! The engine speaks the CGRateS error vocabulary (`NOT_FOUND`,
//! `MANDATORY_IE_MISSING: [...]`, `SERVER_ERROR: ...`) so that callers used
//! to that wire format can match on the display text. Infrastructure errors
//! keep the ApoloBilling style and map to HTTP responses.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Main application error type
///
/// All errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    // ==================== Engine Errors ====================
    #[error("NOT_FOUND")]
    NotFound,

    #[error("MANDATORY_IE_MISSING: [{}]", .0.join(" "))]
    MandatoryIeMissing(Vec<String>),

    #[error("NO_DATABASE_CONNECTION")]
    NoDatabaseConn,

    #[error("WRONG_PATH")]
    WrongPath,

    #[error("SERVER_ERROR: {0}")]
    ServerError(String),

    #[error("NOT_IMPLEMENTED:{0}")]
    NotImplemented(String),

    #[error("Unsupported time format")]
    UnsupportedTimeFormat,

    #[error("unsupported type: <{0}>")]
    UnsupportedType(String),

    #[error("{0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Parse(String),

    /// Option conversion failures are surfaced verbatim to the caller
    #[error("{0}")]
    OptConversion(String),

    #[error("{0}")]
    Syntax(String),

    // ==================== Cache Errors ====================
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Cache connection failed: {0}")]
    CacheConnection(String),

    // ==================== Authentication Errors ====================
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Wrap everything except the pass-through kinds as `SERVER_ERROR`
    ///
    /// `NOT_FOUND`, `NO_DATABASE_CONNECTION`, `WRONG_PATH`, missing mandatory
    /// fields and option conversion failures reach the caller unchanged.
    pub fn into_server_error(self) -> Self {
        match self {
            AppError::NotFound
            | AppError::NoDatabaseConn
            | AppError::WrongPath
            | AppError::MandatoryIeMissing(_)
            | AppError::OptConversion(_)
            | AppError::ServerError(_) => self,
            other => AppError::ServerError(other.to_string()),
        }
    }

    /// Shorthand for a single missing mandatory field
    pub fn mandatory(field: impl Into<String>) -> Self {
        AppError::MandatoryIeMissing(vec![field.into()])
    }

    /// Returns true for the "nothing matched" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound)
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::MandatoryIeMissing(_)
            | AppError::OptConversion(_)
            | AppError::Validation(_)
            | AppError::Syntax(_)
            | AppError::InvalidArguments(_)
            | AppError::Parse(_)
            | AppError::UnsupportedTimeFormat
            | AppError::UnsupportedType(_) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound => StatusCode::NOT_FOUND,

            // 501 Not Implemented
            AppError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,

            // 503 Service Unavailable
            AppError::NoDatabaseConn | AppError::CacheConnection(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::MandatoryIeMissing(_) => "mandatory_ie_missing",
            AppError::NoDatabaseConn => "no_database_connection",
            AppError::WrongPath => "wrong_path",
            AppError::ServerError(_) => "server_error",
            AppError::NotImplemented(_) => "not_implemented",
            AppError::UnsupportedTimeFormat => "unsupported_time_format",
            AppError::UnsupportedType(_) => "unsupported_type",
            AppError::InvalidArguments(_) => "invalid_arguments",
            AppError::Parse(_) => "parse_error",
            AppError::OptConversion(_) => "option_conversion",
            AppError::Syntax(_) => "syntax_error",
            AppError::Cache(_) => "cache_error",
            AppError::CacheConnection(_) => "cache_connection_error",
            AppError::PasswordHash(_) => "password_error",
            AppError::Validation(_) => "validation_error",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
