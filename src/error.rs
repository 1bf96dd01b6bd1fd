use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::error;

/// Message returned for any failure the client should not see details of.
const GENERIC_INTERNAL_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Validation error: {message}")]
    ValidationError {
        message: String,
        fields: BTreeMap<String, String>,
    },

    #[error("Too many requests, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Validation failure without per-field details.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Text shown to the client. Internal failures are masked.
    fn public_message(&self) -> String {
        match self {
            AppError::AuthError(e) => e.to_string(),
            AppError::ValidationError { message, .. } => message.clone(),
            AppError::RateLimited { .. } => "Too many requests. Please try again later.".to_string(),
            AppError::NotFound(what) => what.clone(),
            AppError::DatabaseError(DatabaseError::Duplicate(_)) => "Email already in use".to_string(),
            AppError::DatabaseError(DatabaseError::NotFound) => "Record not found".to_string(),
            _ => GENERIC_INTERNAL_MESSAGE.to_string(),
        }
    }
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

// Implement conversion from sqlx::Error
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::DatabaseError(DatabaseError::MigrationError(err.to_string()))
    }
}

// Add conversion from std::io::Error
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::validation(format!("Invalid JSON in request body: {}", err))
    }
}

// Implement actix_web::ResponseError for AppError
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let mut body = json!({
            "status": status.as_u16(),
            "message": self.public_message(),
        });
        match self {
            AppError::ValidationError { fields, .. } if !fields.is_empty() => {
                body["details"] = json!(fields);
            }
            AppError::RateLimited { retry_after } => {
                body["retryAfter"] = json!(retry_after);
            }
            _ => {}
        }

        let mut response = HttpResponse::build(status);
        if let AppError::RateLimited { retry_after } = self {
            response.insert_header(("Retry-After", retry_after.to_string()));
        }
        response.json(json!({ "error": body }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthError(e) => match e {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
                AuthError::MissingSecret => StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::TokenCreation(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(DatabaseError::NotFound) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(DatabaseError::Duplicate(_)) => StatusCode::CONFLICT,
            AppError::DatabaseError(DatabaseError::ConnectionError(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("JWT secret is not configured")]
    MissingSecret,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        }
    }
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record: {0}")]
    Duplicate(String),
}

/// Postgres SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                DatabaseError::Duplicate(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionError(err.to_string())
            }
            _ => DatabaseError::QueryError(err.to_string()),
        }
    }
}
