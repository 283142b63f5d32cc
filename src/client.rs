//! The query client.
//!
//! Submits a query, polls its status until it reaches a terminal state and
//! reads the result file back into a [`ResultTable`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aws::load_sdk_config;
use crate::config::{ClientConfig, PollConfig};
use crate::error::{AthenaError, Result};
use crate::location::ObjectLocation;
use crate::service::{
    AthenaQueryService, EncryptionOption, ExecutionState, JobId, QueryExecution, QueryService,
    StartQueryRequest, SubmitOptions,
};
use crate::sql::{is_select_query, sniff_columns};
use crate::storage::{ObjectStoreResultStore, ResultStore};
use crate::table::ResultTable;

/// How to wait for a query to finish.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Delay between status checks.
    pub poll_interval: Duration,

    /// Give up after this long. `None` waits forever.
    pub timeout: Option<Duration>,

    /// Stops the wait when cancelled.
    pub cancel: Option<CancellationToken>,

    /// Ask the service to stop the query on timeout or cancellation.
    pub cancel_remote_on_abort: bool,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::from_config(&PollConfig::default())
    }
}

impl WaitOptions {
    /// Creates wait options from polling configuration.
    pub fn from_config(poll: &PollConfig) -> Self {
        Self {
            poll_interval: poll.interval(),
            timeout: poll.timeout(),
            cancel: None,
            cancel_remote_on_abort: poll.cancel_remote_on_abort,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Leaves the remote query running when the wait is abandoned.
    pub fn keep_remote_running(mut self) -> Self {
        self.cancel_remote_on_abort = false;
        self
    }
}

/// Client for running queries and fetching their results.
///
/// Holds only configuration and backend handles, so one client can serve
/// concurrent calls; each call tracks its own job.
#[derive(Clone)]
pub struct QueryClient {
    config: ClientConfig,
    service: Arc<dyn QueryService>,
    store: Arc<dyn ResultStore>,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl QueryClient {
    /// Creates a client talking to Athena and S3.
    ///
    /// Credentials and, unless configured, the region come from the ambient
    /// AWS configuration, resolved once and shared by the Athena and S3
    /// handles. A missing output location is not an error here; it is
    /// reported by the first `execute`.
    pub async fn connect(config: ClientConfig) -> Self {
        let sdk_config = load_sdk_config(config.region.as_deref()).await;
        let service = AthenaQueryService::from_sdk_config(&sdk_config);
        let store = ObjectStoreResultStore::from_sdk_config(&sdk_config);
        Self::with_backends(config, Arc::new(service), Arc::new(store))
    }

    /// Creates a client from explicit backends.
    pub fn with_backends(
        config: ClientConfig,
        service: Arc<dyn QueryService>,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            config,
            service,
            store,
        }
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the wait options derived from the configuration.
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::from_config(&self.config.poll)
    }

    /// Submits a query with the configured submission options.
    pub async fn execute(&self, query: &str) -> Result<JobId> {
        self.execute_with(query, &self.config.submit).await
    }

    /// Submits a query for asynchronous execution and returns its job id.
    ///
    /// Results are written to the configured output location with SSE-S3
    /// encryption. Rejections are returned as-is, never retried.
    pub async fn execute_with(&self, query: &str, options: &SubmitOptions) -> Result<JobId> {
        if query.trim().is_empty() {
            return Err(AthenaError::submission("Query is empty"));
        }
        let output_location = self.config.resolve_output_location()?;

        info!("Running query: {}", query);

        let request = StartQueryRequest {
            query: query.to_string(),
            output_location: output_location.to_uri(),
            encryption: EncryptionOption::SseS3,
            options: options.clone(),
        };
        let job_id = self.service.start_query(&request).await?;

        info!("Query submitted with id {}", job_id);
        Ok(job_id)
    }

    /// Waits for a job using the configured wait options.
    pub async fn wait_for_completion(&self, job_id: &JobId) -> Result<QueryExecution> {
        self.wait_for_completion_with(job_id, &self.wait_options())
            .await
    }

    /// Polls a job until it reaches a terminal state.
    ///
    /// Returns the final snapshot on success. `FAILED` and `CANCELLED` become
    /// errors carrying the reason from the last snapshot. The status is
    /// always checked at least once and never again after a terminal state.
    pub async fn wait_for_completion_with(
        &self,
        job_id: &JobId,
        options: &WaitOptions,
    ) -> Result<QueryExecution> {
        let started = Instant::now();
        let mut last_state = None;

        loop {
            let execution = self.service.get_execution(job_id).await?;

            if last_state != Some(execution.state) {
                debug!("Query {} status: {}", job_id, execution.state);
                last_state = Some(execution.state);
            }

            if execution.state.is_terminal() {
                return finished(execution);
            }

            let elapsed = started.elapsed();
            let delay = match options.timeout {
                Some(timeout) if elapsed >= timeout => {
                    self.abandon(job_id, options).await;
                    return Err(AthenaError::Timeout {
                        job_id: job_id.to_string(),
                        elapsed,
                    });
                }
                Some(timeout) => options.poll_interval.min(timeout - elapsed),
                None => options.poll_interval,
            };

            match &options.cancel {
                Some(token) => {
                    tokio::select! {
                        biased;

                        _ = token.cancelled() => {
                            self.abandon(job_id, options).await;
                            return Err(AthenaError::Aborted {
                                job_id: job_id.to_string(),
                            });
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }
    }

    /// Asks the service to stop a job.
    pub async fn cancel(&self, job_id: &JobId) -> Result<()> {
        info!("Stopping query {}", job_id);
        self.service.stop_query(job_id).await
    }

    /// Runs a query with the configured options and fetches its result.
    pub async fn run_and_fetch(&self, query: &str) -> Result<Option<ResultTable>> {
        self.run_and_fetch_with(query, &self.config.submit, &self.wait_options())
            .await
    }

    /// Runs a query, waits for it and reads the result file.
    ///
    /// Returns `None` when the result file is empty. For a `SELECT` the first
    /// line of the file is the header; other statements produce positional
    /// columns.
    pub async fn run_and_fetch_with(
        &self,
        query: &str,
        submit: &SubmitOptions,
        wait: &WaitOptions,
    ) -> Result<Option<ResultTable>> {
        let has_header = is_select_query(query);
        let sniffed = sniff_columns(query);

        let job_id = self.execute_with(query, submit).await?;
        let execution = self.wait_for_completion_with(&job_id, wait).await?;

        info!("Query {} completed", job_id);
        if let Some(stats) = &execution.statistics {
            debug!(
                "Query {} scanned {:?} bytes in {:?} ms",
                job_id, stats.data_scanned_bytes, stats.engine_execution_time_ms
            );
        }

        let location = self.result_object(&execution)?;
        info!("Results at {}", location);
        let content = self.store.get(&location).await?;

        if content.is_empty() {
            info!("Query {} returned no results", job_id);
            return Ok(None);
        }

        let table = ResultTable::from_csv(&content, has_header)?;

        if let (Some(sniffed), Some(columns)) = (&sniffed, &table.columns) {
            if sniffed != columns {
                debug!(
                    "Projected columns {:?} differ from result header {:?}",
                    sniffed, columns
                );
            }
        }

        Ok(Some(table))
    }

    /// Locates the result object of a finished job.
    ///
    /// Prefers the URI the service reported; otherwise the object is
    /// `<output location><job id>.csv`.
    fn result_object(&self, execution: &QueryExecution) -> Result<ObjectLocation> {
        match &execution.output_location {
            Some(uri) => ObjectLocation::from_uri(uri),
            None => Ok(self
                .config
                .resolve_output_location()?
                .result_object(execution.job_id.as_str())),
        }
    }

    async fn abandon(&self, job_id: &JobId, options: &WaitOptions) {
        if !options.cancel_remote_on_abort {
            return;
        }
        match self.service.stop_query(job_id).await {
            Ok(()) => info!("Requested stop of query {}", job_id),
            Err(e) => warn!("Failed to stop query {}: {}", job_id, e),
        }
    }
}

/// Turns a terminal snapshot into the wait result.
fn finished(execution: QueryExecution) -> Result<QueryExecution> {
    match execution.state {
        ExecutionState::Failed => Err(AthenaError::QueryFailed {
            job_id: execution.job_id.to_string(),
            reason: execution.reason(),
        }),
        ExecutionState::Cancelled => Err(AthenaError::QueryCancelled {
            job_id: execution.job_id.to_string(),
            reason: execution.reason(),
        }),
        ExecutionState::Succeeded | ExecutionState::Queued | ExecutionState::Running => {
            Ok(execution)
        }
    }
}
