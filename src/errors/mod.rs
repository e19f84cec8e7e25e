//! Error handling module for the Leaf bot.
//!
//! Provides centralized error types with mapping to HTTP status codes, response envelopes
//! and the chat-facing text shown to users.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const NAME_RESERVED: &str = "NAME_RESERVED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const COLLECTION_TIMED_OUT: &str = "COLLECTION_TIMED_OUT";
    pub const INVALID_INPUT: &str = "INVALID_INPUT";
    pub const PERSISTENCE_FAILURE: &str = "PERSISTENCE_FAILURE";
    pub const SEARCH_ERROR: &str = "SEARCH_ERROR";
    pub const MESSAGING_ERROR: &str = "MESSAGING_ERROR";
    pub const IMAGE_ERROR: &str = "IMAGE_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// Generic text shown in chat when a collaborator fails.
const GENERIC_FAILURE: &str = "Something went wrong while processing that command.";

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Authentication required
    Unauthorized(String),
    /// Tag (or other resource) absent
    NotFound(String),
    /// A live tag already uses the name
    AlreadyExists(String),
    /// Another workflow is currently claiming the name
    NameReserved(String),
    /// Actor is not allowed to perform the action
    PermissionDenied(String),
    /// No reply arrived before the deadline
    CollectionTimedOut,
    /// User supplied input was rejected
    InvalidInput(String),
    /// Tag store failure
    Persistence(String),
    /// Search index error
    Search(String),
    /// Gateway bridge call failed
    Messaging(String),
    /// Image encoding or worker failure
    Image(String),
    /// Malformed configuration
    Config(String),
    /// Bad request
    BadRequest(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) | AppError::NameReserved(_) => StatusCode::CONFLICT,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::CollectionTimedOut => StatusCode::REQUEST_TIMEOUT,
            AppError::InvalidInput(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Persistence(_)
            | AppError::Search(_)
            | AppError::Image(_)
            | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Messaging(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::AlreadyExists(_) => codes::ALREADY_EXISTS,
            AppError::NameReserved(_) => codes::NAME_RESERVED,
            AppError::PermissionDenied(_) => codes::PERMISSION_DENIED,
            AppError::CollectionTimedOut => codes::COLLECTION_TIMED_OUT,
            AppError::InvalidInput(_) => codes::INVALID_INPUT,
            AppError::Persistence(_) => codes::PERSISTENCE_FAILURE,
            AppError::Search(_) => codes::SEARCH_ERROR,
            AppError::Messaging(_) => codes::MESSAGING_ERROR,
            AppError::Image(_) => codes::IMAGE_ERROR,
            AppError::Config(_) => codes::CONFIG_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::AlreadyExists(msg)
            | AppError::NameReserved(msg)
            | AppError::PermissionDenied(msg)
            | AppError::InvalidInput(msg)
            | AppError::Persistence(msg)
            | AppError::Search(msg)
            | AppError::Messaging(msg)
            | AppError::Image(msg)
            | AppError::Config(msg)
            | AppError::BadRequest(msg) => msg.clone(),
            AppError::CollectionTimedOut => "You took too long to respond.".to_string(),
        }
    }

    /// Text shown to the invoking user in chat.
    ///
    /// Collaborator failures are not leaked verbatim.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Persistence(_)
            | AppError::Search(_)
            | AppError::Messaging(_)
            | AppError::Image(_)
            | AppError::Config(_) => GENERIC_FAILURE.to_string(),
            _ => self.message(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Persistence(format!("Database error: {}", err))
    }
}

impl From<tantivy::TantivyError> for AppError {
    fn from(err: tantivy::TantivyError) -> Self {
        tracing::error!("Search error: {:?}", err);
        AppError::Search(format!("Search error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Gateway bridge error: {:?}", err);
        AppError::Messaging(format!("Gateway bridge error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self::new(error.error_code(), error.message())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::from(&self);
        (status, Json(body)).into_response()
    }
}
