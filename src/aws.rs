//! AWS configuration shared by the Athena and S3 handles.
//!
//! The SDK config is resolved once per client and its region and credential
//! chain are handed to both the query service and the result store.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use object_store::aws::AwsCredential;
use object_store::CredentialProvider;
use tokio::sync::Mutex;
use tracing::debug;

/// Refresh credentials this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Loads the ambient AWS configuration.
///
/// `region` overrides the region resolved from the environment and profile.
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        debug!("Using AWS region {}", region);
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}

/// Exposes an SDK credential chain to `object_store`.
#[derive(Debug)]
pub struct SdkCredentialProvider {
    provider: SharedCredentialsProvider,
    cached: Mutex<Option<CachedCredential>>,
}

#[derive(Debug)]
struct CachedCredential {
    credential: Arc<AwsCredential>,
    expiry: Option<SystemTime>,
}

impl CachedCredential {
    fn is_fresh(&self) -> bool {
        match self.expiry {
            Some(expiry) => expiry > SystemTime::now() + EXPIRY_MARGIN,
            None => true,
        }
    }
}

impl SdkCredentialProvider {
    pub fn new(provider: SharedCredentialsProvider) -> Self {
        Self {
            provider,
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl CredentialProvider for SdkCredentialProvider {
    type Credential = AwsCredential;

    async fn get_credential(&self) -> object_store::Result<Arc<AwsCredential>> {
        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref().filter(|entry| entry.is_fresh()) {
            return Ok(Arc::clone(&entry.credential));
        }

        let credentials = self
            .provider
            .provide_credentials()
            .await
            .map_err(|e| object_store::Error::Generic {
                store: "S3",
                source: Box::new(e),
            })?;
        debug!("Resolved S3 credentials");

        let credential = Arc::new(AwsCredential {
            key_id: credentials.access_key_id().to_string(),
            secret_key: credentials.secret_access_key().to_string(),
            token: credentials.session_token().map(str::to_string),
        });
        *cached = Some(CachedCredential {
            credential: Arc::clone(&credential),
            expiry: credentials.expiry(),
        });

        Ok(credential)
    }
}
