//! Mock query service for testing.
//!
//! Replays a scripted sequence of execution states and records every call.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{ExecutionState, JobId, QueryExecution, QueryService, StartQueryRequest};
use crate::error::{AthenaError, Result};
use crate::location::RESULT_FILE_SUFFIX;

/// A query service that returns scripted states.
///
/// Each poll of a job returns the next state of the script; the last state
/// repeats once the script runs out. A stopped job reports `CANCELLED`.
#[derive(Debug)]
pub struct MockQueryService {
    script: Vec<ExecutionState>,
    reason: Option<String>,
    report_output_location: bool,
    rejection: Option<String>,
    calls: Mutex<Calls>,
}

#[derive(Debug, Default)]
struct Calls {
    submitted: Vec<StartQueryRequest>,
    jobs: HashMap<JobId, Job>,
    stopped: Vec<JobId>,
}

#[derive(Debug)]
struct Job {
    request: StartQueryRequest,
    polls: usize,
    stopped: bool,
}

impl MockQueryService {
    /// Creates a service whose jobs succeed on the first poll.
    pub fn new() -> Self {
        Self::with_states(vec![ExecutionState::Succeeded])
    }

    /// Creates a service whose jobs go through the given states.
    pub fn with_states(script: Vec<ExecutionState>) -> Self {
        Self {
            script,
            reason: None,
            report_output_location: true,
            rejection: None,
            calls: Mutex::new(Calls::default()),
        }
    }

    /// Sets the state change reason reported on every poll.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Omits the result location from execution snapshots.
    pub fn without_output_location(mut self) -> Self {
        self.report_output_location = false;
        self
    }

    /// Rejects every submission with the given message.
    pub fn rejecting(mut self, message: impl Into<String>) -> Self {
        self.rejection = Some(message.into());
        self
    }

    /// Returns every request submitted so far.
    pub fn submitted(&self) -> Vec<StartQueryRequest> {
        self.lock().submitted.clone()
    }

    /// Returns how many times the job has been polled.
    pub fn poll_count(&self, job_id: &JobId) -> usize {
        self.lock().jobs.get(job_id).map_or(0, |job| job.polls)
    }

    /// Returns the jobs a stop was requested for.
    pub fn stopped(&self) -> Vec<JobId> {
        self.lock().stopped.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Calls> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn scripted_state(&self, poll: usize) -> ExecutionState {
        self.script
            .get(poll)
            .or_else(|| self.script.last())
            .copied()
            .unwrap_or(ExecutionState::Succeeded)
    }
}

impl Default for MockQueryService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryService for MockQueryService {
    async fn start_query(&self, request: &StartQueryRequest) -> Result<JobId> {
        if let Some(message) = &self.rejection {
            return Err(AthenaError::submission(message.clone()));
        }

        let mut calls = self.lock();
        calls.submitted.push(request.clone());
        let job_id = JobId::new(format!("job-{}", calls.submitted.len()));
        calls.jobs.insert(
            job_id.clone(),
            Job {
                request: request.clone(),
                polls: 0,
                stopped: false,
            },
        );
        Ok(job_id)
    }

    async fn get_execution(&self, job_id: &JobId) -> Result<QueryExecution> {
        let mut calls = self.lock();
        let job = calls
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| AthenaError::service(format!("Unknown query execution {job_id}")))?;

        let poll = job.polls;
        job.polls += 1;

        let (state, reason) = if job.stopped {
            (
                ExecutionState::Cancelled,
                Some("Query cancelled by user".to_string()),
            )
        } else {
            (self.scripted_state(poll), self.reason.clone())
        };

        let output_location = self.report_output_location.then(|| {
            format!(
                "{}{}{}",
                job.request.output_location, job_id, RESULT_FILE_SUFFIX
            )
        });

        Ok(QueryExecution {
            job_id: job_id.clone(),
            query: Some(job.request.query.clone()),
            state,
            state_change_reason: reason,
            output_location,
            statistics: None,
        })
    }

    async fn stop_query(&self, job_id: &JobId) -> Result<()> {
        let mut calls = self.lock();
        let job = calls
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| AthenaError::service(format!("Unknown query execution {job_id}")))?;
        job.stopped = true;
        calls.stopped.push(job_id.clone());
        Ok(())
    }
}
