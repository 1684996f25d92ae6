//! Unified error handling for the outreach crate
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! classifies failures the way the HTTP boundary needs to see them:
//!
//! - [`Error::BadRequest`] - malformed or missing input, rejected before any mutation
//! - [`Error::NotFound`] - a referenced document does not exist
//! - [`Error::RecordNotFound`] - a customer is not part of a communication batch
//! - everything else - storage, transport or configuration failures
//!
//! # Usage
//!
//! ```rust,ignore
//! use outreach::error::{Error, ErrorCategory};
//!
//! fn handle_error(err: Error) {
//!     match err.category() {
//!         ErrorCategory::Validation => eprintln!("rejected: {err}"),
//!         _ if err.is_recoverable() => eprintln!("transient: {err}"),
//!         _ => eprintln!("fatal: {err}"),
//!     }
//! }
//! ```

use std::io;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Input validation errors
    Validation,
    /// Missing documents or records
    NotFound,
    /// Storage and I/O errors
    Storage,
    /// Network-related errors (status callback, transport)
    Network,
    /// Configuration errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short machine-readable code used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::Storage => "STORAGE_ERROR",
            Self::Network => "NETWORK_ERROR",
            Self::Config => "CONFIG_ERROR",
            Self::Other => "INTERNAL_ERROR",
        }
    }
}

/// Unified error type for the outreach crate
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing required input
    #[error("{0}")]
    BadRequest(String),

    /// Referenced document is absent
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Customer is not part of the communication batch
    #[error("Customer {customer} not found in communication {batch}")]
    RecordNotFound { batch: String, customer: String },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a validation error
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Create a not-found error for a document kind
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a missing-record error for a batch member
    pub fn record_not_found(batch: impl ToString, customer: impl ToString) -> Self {
        Self::RecordNotFound {
            batch: batch.to_string(),
            customer: customer.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::BadRequest(_) => ErrorCategory::Validation,
            Self::NotFound { .. } | Self::RecordNotFound { .. } => ErrorCategory::NotFound,
            Self::Database(_) | Self::Io(_) | Self::Json(_) => ErrorCategory::Storage,
            Self::Http(_) => ErrorCategory::Network,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }

    /// Check if this error is transient (a later attempt may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) | Self::Http(_) => true,
            Self::Database(e) => matches!(
                e.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            ),
            _ => false,
        }
    }

    /// HTTP status the API answers with for this error
    pub fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// JSON body for failed API calls
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the log.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, category = ?self.category(), "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            success: false,
            error: message,
            code: self.category().code(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
