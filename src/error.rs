//! Error types for athena-fetch.
//!
//! Defines the error enum returned by every client operation.

use std::time::Duration;
use thiserror::Error;

/// Main error type for athena-fetch operations.
#[derive(Error, Debug)]
pub enum AthenaError {
    /// Configuration errors (missing or malformed output location, bad config file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The service rejected the submission (syntax, permissions, quota, etc.)
    #[error("Submission error: {0}")]
    Submission(String),

    /// A status or stop call to the query service failed.
    #[error("Service error: {0}")]
    Service(String),

    /// The query reached the FAILED state.
    #[error("Query {job_id} failed: {reason}")]
    QueryFailed { job_id: String, reason: String },

    /// The query reached the CANCELLED state.
    #[error("Query {job_id} was cancelled: {reason}")]
    QueryCancelled { job_id: String, reason: String },

    /// Polling exceeded the configured wait deadline.
    #[error("Query {job_id} did not finish within {elapsed:?}")]
    Timeout { job_id: String, elapsed: Duration },

    /// The caller cancelled the wait.
    #[error("Wait for query {job_id} was aborted")]
    Aborted { job_id: String },

    /// The result object could not be read.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The result object could not be decoded as delimited text.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl AthenaError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a submission error with the given message.
    pub fn submission(msg: impl Into<String>) -> Self {
        Self::Submission(msg.into())
    }

    /// Creates a service error with the given message.
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Creates a storage error with the given message.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Creates a parse error with the given message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Submission(_) => "Submission Error",
            Self::Service(_) => "Service Error",
            Self::QueryFailed { .. } => "Query Failed",
            Self::QueryCancelled { .. } => "Query Cancelled",
            Self::Timeout { .. } => "Timeout",
            Self::Aborted { .. } => "Aborted",
            Self::Storage(_) => "Storage Error",
            Self::Parse(_) => "Parse Error",
        }
    }

    /// Returns the job id the error refers to, if any.
    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::QueryFailed { job_id, .. }
            | Self::QueryCancelled { job_id, .. }
            | Self::Timeout { job_id, .. }
            | Self::Aborted { job_id } => Some(job_id),
            _ => None,
        }
    }
}

impl From<csv::Error> for AthenaError {
    fn from(e: csv::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<object_store::Error> for AthenaError {
    fn from(e: object_store::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Result type alias using AthenaError.
pub type Result<T> = std::result::Result<T, AthenaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let err = AthenaError::config("no output location configured");
        assert_eq!(
            err.to_string(),
            "Configuration error: no output location configured"
        );
        assert_eq!(err.category(), "Configuration Error");
    }

    #[test]
    fn test_error_display_query_failed() {
        let err = AthenaError::QueryFailed {
            job_id: "abc-123".to_string(),
            reason: "SYNTAX_ERROR: line 1:8: Column 'x' cannot be resolved".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Query abc-123 failed: SYNTAX_ERROR: line 1:8: Column 'x' cannot be resolved"
        );
        assert_eq!(err.category(), "Query Failed");
        assert_eq!(err.job_id(), Some("abc-123"));
    }

    #[test]
    fn test_error_display_timeout() {
        let err = AthenaError::Timeout {
            job_id: "abc".to_string(),
            elapsed: Duration::from_secs(3),
        };
        assert_eq!(err.to_string(), "Query abc did not finish within 3s");
        assert_eq!(err.category(), "Timeout");
    }

    #[test]
    fn test_error_job_id_absent_for_config() {
        assert_eq!(AthenaError::storage("denied").job_id(), None);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AthenaError>();
    }
}
