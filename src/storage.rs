//! Result object storage for athena-fetch.
//!
//! Reads the result files the query service writes, through the
//! `object_store` crate: S3 in production, memory in tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use aws_config::SdkConfig;
use bytes::Bytes;
use object_store::aws::{AmazonS3Builder, AwsCredentialProvider};
use object_store::memory::InMemory;
use object_store::path::Path as ObjectStorePath;
use object_store::{ObjectStore, PutPayload};
use tracing::debug;

use crate::aws::SdkCredentialProvider;
use crate::error::{AthenaError, Result};
use crate::location::ObjectLocation;

/// Trait defining read access to result objects.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Reads the full content of an object.
    async fn get(&self, location: &ObjectLocation) -> Result<Bytes>;
}

#[derive(Debug)]
enum Backend {
    S3 {
        region: Option<String>,
        credentials: Option<AwsCredentialProvider>,
    },
    Memory,
}

/// `ResultStore` backed by `object_store`, one store per bucket.
#[derive(Debug)]
pub struct ObjectStoreResultStore {
    backend: Backend,
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl ObjectStoreResultStore {
    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Reads from S3 in `region` with the given credentials.
    ///
    /// Without credentials `object_store` falls back to its own environment
    /// lookup.
    pub fn s3(region: Option<String>, credentials: Option<AwsCredentialProvider>) -> Self {
        Self::with_backend(Backend::S3 {
            region,
            credentials,
        })
    }

    /// Reads from S3 with the region and credential chain of `sdk_config`.
    pub fn from_sdk_config(sdk_config: &SdkConfig) -> Self {
        let region = sdk_config.region().map(|r| r.as_ref().to_string());
        let credentials = sdk_config.credentials_provider().map(|provider| {
            Arc::new(SdkCredentialProvider::new(provider)) as AwsCredentialProvider
        });
        Self::s3(region, credentials)
    }

    /// Reads from in-memory buckets populated with [`put`](Self::put).
    pub fn in_memory() -> Self {
        Self::with_backend(Backend::Memory)
    }

    /// Returns the S3 region, if one was configured.
    pub fn region(&self) -> Option<&str> {
        match &self.backend {
            Backend::S3 { region, .. } => region.as_deref(),
            Backend::Memory => None,
        }
    }

    /// Writes an object, creating the bucket on first use for in-memory stores.
    pub async fn put(&self, location: &ObjectLocation, data: impl Into<Bytes>) -> Result<()> {
        let store = self.store_for(&location.bucket)?;
        let path = object_path(&location.key)?;
        let data: Bytes = data.into();
        store.put(&path, PutPayload::from(data)).await?;
        Ok(())
    }

    fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        let mut stores = self.stores.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(store) = stores.get(bucket) {
            return Ok(Arc::clone(store));
        }

        let store: Arc<dyn ObjectStore> = match &self.backend {
            Backend::S3 {
                region,
                credentials,
            } => {
                debug!("Opening S3 bucket {}", bucket);
                let mut builder = AmazonS3Builder::new().with_bucket_name(bucket);
                if let Some(region) = region {
                    builder = builder.with_region(region);
                }
                if let Some(credentials) = credentials {
                    builder = builder.with_credentials(Arc::clone(credentials));
                }
                let store = builder
                    .build()
                    .map_err(|e| AthenaError::storage(format!("S3: {e}")))?;
                Arc::new(store)
            }
            Backend::Memory => Arc::new(InMemory::new()),
        };

        stores.insert(bucket.to_string(), Arc::clone(&store));
        Ok(store)
    }
}

#[async_trait]
impl ResultStore for ObjectStoreResultStore {
    async fn get(&self, location: &ObjectLocation) -> Result<Bytes> {
        debug!("Reading result object {}", location);
        let store = self.store_for(&location.bucket)?;
        let path = object_path(&location.key)?;

        let result = store.get(&path).await?;
        let bytes = result.bytes().await?;

        Ok(bytes)
    }
}

fn object_path(key: &str) -> Result<ObjectStorePath> {
    ObjectStorePath::parse(key)
        .map_err(|e| AthenaError::storage(format!("Invalid object key '{key}': {e}")))
}
