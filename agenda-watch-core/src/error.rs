//! Error types for agenda-watch collaborators.
//!
//! Diffing and rendering never fail; only fetching a feed and delivering a
//! notification can.

use thiserror::Error;

/// Errors that prevent a snapshot from being obtained.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid calendar URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Calendar feed returned HTTP {0}")]
    Status(u16),

    #[error("ICS parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while handing rendered groups to a destination.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Destination returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;
