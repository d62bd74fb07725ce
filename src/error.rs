//! Error types for the report job.
//!
//! Each external surface gets its own enum so the workflow can decide per
//! stage whether a failure aborts the run or is only logged.

use thiserror::Error;

use crate::report::Stage;

/// Token acquisition errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Token endpoint returned HTTP {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("Failed to parse token response: {0}")]
    ParseFailed(String),

    #[error("Token response did not contain an access token")]
    MissingAccessToken,
}

/// Graph and management API errors.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to parse API response: {0}")]
    ParseFailed(String),

    #[error("Unauthorized (401): Token may be expired")]
    Unauthorized,

    #[error("Forbidden (403): Insufficient permissions")]
    Forbidden,

    #[error("Rate limited (429): Too many requests")]
    RateLimited,

    #[error("API request failed with HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Paging aborted: {0}")]
    Paging(String),
}

impl ApiError {
    /// Classify a non-success response.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            429 => Self::RateLimited,
            status => Self::RequestFailed { status, body },
        }
    }
}

/// Connection string parsing errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConnectionStringError {
    #[error("Connection string segment is not a key=value pair: {0}")]
    Malformed(String),

    #[error("Connection string is missing {0}")]
    MissingKey(&'static str),

    #[error("Connection string has an invalid {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Service Bus errors.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Invalid Service Bus connection string: {0}")]
    ConnectionString(#[from] ConnectionStringError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to encode messages: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Send to queue {queue} failed with HTTP {status}: {body}")]
    SendFailed {
        queue: String,
        status: u16,
        body: String,
    },
}

/// Blob storage errors.
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Invalid storage connection string: {0}")]
    ConnectionString(#[from] ConnectionStringError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid blob URL: {0}")]
    InvalidUrl(String),

    #[error("Blob {operation} failed with HTTP {status}: {body}")]
    RequestFailed {
        operation: &'static str,
        status: u16,
        body: String,
    },
}

/// A failure of one workflow stage.
#[derive(Error, Debug)]
#[error("{stage} failed: {kind}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub kind: StageErrorKind,
}

/// The underlying cause of a [`StageError`].
#[derive(Error, Debug)]
pub enum StageErrorKind {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Blob(#[from] BlobError),
}

impl StageError {
    pub fn new(stage: Stage, kind: impl Into<StageErrorKind>) -> Self {
        Self {
            stage,
            kind: kind.into(),
        }
    }

    /// Whether this failure aborts the run.
    pub fn is_fatal(&self) -> bool {
        self.stage.is_fatal()
    }
}
