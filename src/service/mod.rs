//! Query service abstraction for athena-fetch.
//!
//! Provides a trait-based interface to the remote query engine, allowing
//! the real Athena backend and the scripted test backend to be used
//! interchangeably.

mod athena;
mod mock;

pub use athena::AthenaQueryService;
pub use mock::MockQueryService;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identifier the service assigns to one query execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Execution state reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl ExecutionState {
    /// Returns the state as the service spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a state from the service's spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "QUEUED" => Some(Self::Queued),
            "RUNNING" => Some(Self::Running),
            "SUCCEEDED" => Some(Self::Succeeded),
            "FAILED" => Some(Self::Failed),
            "CANCELLED" | "CANCELED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true once the service will no longer change the state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side encryption applied to the result object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionOption {
    /// S3-managed keys.
    #[default]
    SseS3,
}

impl EncryptionOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SseS3 => "SSE_S3",
        }
    }
}

/// Optional submission parameters passed through to the service unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOptions {
    /// Workgroup to run the query in.
    pub work_group: Option<String>,

    /// Default database for unqualified table names.
    pub database: Option<String>,

    /// Data catalog for unqualified table names.
    pub catalog: Option<String>,

    /// Idempotency token for the submission.
    pub client_request_token: Option<String>,

    /// Values for `?` placeholders, in order.
    #[serde(default)]
    pub execution_parameters: Vec<String>,
}

/// Everything sent to the service to start one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartQueryRequest {
    pub query: String,
    /// `s3://` URI the result is written under.
    pub output_location: String,
    pub encryption: EncryptionOption,
    pub options: SubmitOptions,
}

/// Statistics reported for an execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatistics {
    pub engine_execution_time_ms: Option<i64>,
    pub data_scanned_bytes: Option<i64>,
}

/// A snapshot of one query execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryExecution {
    pub job_id: JobId,

    /// Query text as the service recorded it.
    pub query: Option<String>,

    pub state: ExecutionState,

    /// Service-provided explanation of the state, usually set on failure.
    pub state_change_reason: Option<String>,

    /// `s3://` URI of the result object.
    pub output_location: Option<String>,

    pub statistics: Option<ExecutionStatistics>,
}

impl QueryExecution {
    /// Creates a snapshot with only the job id and state set.
    pub fn new(job_id: JobId, state: ExecutionState) -> Self {
        Self {
            job_id,
            query: None,
            state,
            state_change_reason: None,
            output_location: None,
            statistics: None,
        }
    }

    /// Returns the state change reason, or a placeholder when none was given.
    pub fn reason(&self) -> String {
        self.state_change_reason
            .clone()
            .unwrap_or_else(|| "no reason given".to_string())
    }
}

/// Trait defining the interface to the remote query engine.
///
/// All operations are async and return Results with AthenaError.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Submits a query for asynchronous execution, returning its job id.
    async fn start_query(&self, request: &StartQueryRequest) -> Result<JobId>;

    /// Fetches the current execution snapshot for a job.
    async fn get_execution(&self, job_id: &JobId) -> Result<QueryExecution>;

    /// Asks the service to stop a running job.
    async fn stop_query(&self, job_id: &JobId) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_parse_round_trip() {
        for state in [
            ExecutionState::Queued,
            ExecutionState::Running,
            ExecutionState::Succeeded,
            ExecutionState::Failed,
            ExecutionState::Cancelled,
        ] {
            assert_eq!(ExecutionState::parse(state.as_str()), Some(state));
        }
        assert_eq!(ExecutionState::parse("canceled"), Some(ExecutionState::Cancelled));
        assert_eq!(ExecutionState::parse("PENDING"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ExecutionState::Queued.is_terminal());
        assert!(!ExecutionState::Running.is_terminal());
        assert!(ExecutionState::Succeeded.is_terminal());
        assert!(ExecutionState::Failed.is_terminal());
        assert!(ExecutionState::Cancelled.is_terminal());
    }

    #[test]
    fn test_reason_placeholder() {
        let exec = QueryExecution::new(JobId::from("q"), ExecutionState::Failed);
        assert_eq!(exec.reason(), "no reason given");
    }
}
