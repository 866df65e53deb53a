//! Shared error types for the services crate.

use thiserror::Error;

use drill_core::model::ActivityId;
use storage::repository::StorageError;

/// Marker the platform puts in a 404 body when the attempt's module session lapsed.
pub const SESSION_EXPIRED_MARKER: &str = "ModuleSessionNotFoundOrExpired";

/// Errors emitted by the learning platform client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlatformError {
    #[error("{endpoint}: bad status code {status}: {body}")]
    HttpStatus {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("{endpoint}: decode error (status {status}): {body}")]
    Decode {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("no more activity, too many mistakes")]
    NoMoreActivity,
    #[error("invalid platform configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl PlatformError {
    /// True for the transient 404 the platform returns when an attempt's module session lapsed.
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            PlatformError::HttpStatus { status, body, .. }
                if *status == reqwest::StatusCode::NOT_FOUND && body.contains(SESSION_EXPIRED_MARKER)
        )
    }
}

/// Errors emitted by the LLM answer oracle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OracleError {
    #[error("rate limit reached for the completion model")]
    RateLimited,
    #[error("completion request failed with status {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("completion response is not valid JSON: {0}")]
    Decode(String),
    #[error("completion response is malformed: {0}")]
    MalformedResponse(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted when building pacing bounds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PacingError {
    #[error("minimum delay {min}s exceeds maximum delay {max}s")]
    InvalidBounds { min: u64, max: u64 },
}

/// Errors that end a session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("llm answering is enabled but no oracle was provided")]
    MissingOracle,
    #[error("answer cache is enabled but no cache was provided")]
    MissingCache,
    #[error("platform reported no correct answer for activity {activity}")]
    MissingVerdict { activity: ActivityId },
    #[error("exercise {activity} offers no answers to pick from")]
    NoChoices { activity: ActivityId },
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
