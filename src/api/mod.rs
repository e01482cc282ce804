//! Video-analysis backend client
//!
//! Thin async wrappers over the backend's REST and SSE endpoints:
//! - File upload (multipart, progress reporting), listing and deletion
//! - Chat completion over an uploaded file
//! - Streamed summarization (server-sent events) with cancellation
//! - Model listing (also the health check) and recent alerts

pub mod client;
pub mod sse;
pub mod summarize;
pub mod types;

use thiserror::Error;

pub use client::BackendClient;
pub use sse::{SseDecoder, SseFrame};
pub use summarize::{SummaryJob, SummaryTracker};
pub use types::{
    Alert, AlertSeverity, ChatMessage, ChatRole, FileInfo, FileStatus, Model, SummarizeParams,
};

/// Backend client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend could not be reached at all
    #[error("failed to connect to the video analysis backend at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response; message taken from the error body when present
    #[error("{0}")]
    Status(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("invalid backend URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("summarization cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ApiError>;
