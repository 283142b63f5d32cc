//! Amazon Athena query service implementation.
//!
//! Provides the `AthenaQueryService` struct that implements the `QueryService`
//! trait on top of the AWS SDK.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{
    EncryptionConfiguration, EncryptionOption as SdkEncryptionOption, QueryExecutionContext,
    ResultConfiguration,
};
use aws_sdk_athena::Client;

use super::{
    EncryptionOption, ExecutionState, ExecutionStatistics, JobId, QueryExecution, QueryService,
    StartQueryRequest,
};
use crate::aws::load_sdk_config;
use crate::error::{AthenaError, Result};

/// Athena query service backed by the AWS SDK client.
#[derive(Debug, Clone)]
pub struct AthenaQueryService {
    client: Client,
}

impl AthenaQueryService {
    /// Wraps an already configured SDK client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from a resolved SDK configuration.
    pub fn from_sdk_config(sdk_config: &SdkConfig) -> Self {
        Self::new(Client::new(sdk_config))
    }

    /// Builds a client from the ambient AWS configuration.
    ///
    /// `region` overrides the region resolved from the environment and profile.
    pub async fn from_env(region: Option<&str>) -> Self {
        Self::from_sdk_config(&load_sdk_config(region).await)
    }
}

fn sdk_encryption(option: EncryptionOption) -> SdkEncryptionOption {
    match option {
        EncryptionOption::SseS3 => SdkEncryptionOption::SseS3,
    }
}

#[async_trait]
impl QueryService for AthenaQueryService {
    async fn start_query(&self, request: &StartQueryRequest) -> Result<JobId> {
        let encryption = EncryptionConfiguration::builder()
            .encryption_option(sdk_encryption(request.encryption))
            .build()
            .map_err(|e| AthenaError::submission(e.to_string()))?;

        let result_configuration = ResultConfiguration::builder()
            .output_location(&request.output_location)
            .encryption_configuration(encryption)
            .build();

        let options = &request.options;
        let mut call = self
            .client
            .start_query_execution()
            .query_string(&request.query)
            .result_configuration(result_configuration)
            .set_work_group(options.work_group.clone())
            .set_client_request_token(options.client_request_token.clone());

        if options.database.is_some() || options.catalog.is_some() {
            call = call.query_execution_context(
                QueryExecutionContext::builder()
                    .set_database(options.database.clone())
                    .set_catalog(options.catalog.clone())
                    .build(),
            );
        }
        if !options.execution_parameters.is_empty() {
            call = call.set_execution_parameters(Some(options.execution_parameters.clone()));
        }

        let output = call
            .send()
            .await
            .map_err(|e| AthenaError::submission(DisplayErrorContext(&e).to_string()))?;

        output
            .query_execution_id()
            .map(JobId::from)
            .ok_or_else(|| AthenaError::submission("Service returned no query execution id"))
    }

    async fn get_execution(&self, job_id: &JobId) -> Result<QueryExecution> {
        let output = self
            .client
            .get_query_execution()
            .query_execution_id(job_id.as_str())
            .send()
            .await
            .map_err(|e| AthenaError::service(DisplayErrorContext(&e).to_string()))?;

        let execution = output
            .query_execution()
            .ok_or_else(|| AthenaError::service(format!("No execution returned for {job_id}")))?;
        let status = execution
            .status()
            .ok_or_else(|| AthenaError::service(format!("No status returned for {job_id}")))?;
        let raw_state = status
            .state()
            .ok_or_else(|| AthenaError::service(format!("No state returned for {job_id}")))?;
        let state = ExecutionState::parse(raw_state.as_str()).ok_or_else(|| {
            AthenaError::service(format!("Unknown query state: {}", raw_state.as_str()))
        })?;

        Ok(QueryExecution {
            job_id: job_id.clone(),
            query: execution.query().map(String::from),
            state,
            state_change_reason: status.state_change_reason().map(String::from),
            output_location: execution
                .result_configuration()
                .and_then(|rc| rc.output_location())
                .map(String::from),
            statistics: execution.statistics().map(|s| ExecutionStatistics {
                engine_execution_time_ms: s.engine_execution_time_in_millis(),
                data_scanned_bytes: s.data_scanned_in_bytes(),
            }),
        })
    }

    async fn stop_query(&self, job_id: &JobId) -> Result<()> {
        self.client
            .stop_query_execution()
            .query_execution_id(job_id.as_str())
            .send()
            .await
            .map_err(|e| AthenaError::service(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdk_encryption_is_sse_s3() {
        assert_eq!(sdk_encryption(EncryptionOption::SseS3).as_str(), "SSE_S3");
        assert_eq!(
            sdk_encryption(EncryptionOption::default()).as_str(),
            EncryptionOption::SseS3.as_str()
        );
    }
}
