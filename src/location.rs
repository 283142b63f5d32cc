//! S3 locations for query output.
//!
//! `OutputLocation` is the bucket/prefix the service writes results under;
//! `ObjectLocation` names one result object inside it.

use std::fmt;

use url::Url;

use crate::error::{AthenaError, Result};

const S3_SCHEME: &str = "s3";

/// Suffix the service gives the result file of a query.
pub const RESULT_FILE_SUFFIX: &str = ".csv";

/// Bucket and key prefix where query results are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLocation {
    bucket: String,
    prefix: String,
}

impl OutputLocation {
    /// Parses an output location.
    ///
    /// Accepts either a full URI (`s3://bucket/some/prefix/`) or a bare
    /// `bucket` / `bucket/prefix` string. The prefix is normalized to have no
    /// leading slash and, when non-empty, a trailing one.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AthenaError::config("Output location is empty"));
        }

        let uri = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("{S3_SCHEME}://{trimmed}")
        };

        let (bucket, path) = split_s3_uri(&uri)?;
        let mut prefix = path.to_string();
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }

        Ok(Self { bucket, prefix })
    }

    /// Returns the bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the key prefix (empty, or ending in `/`).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the location as an `s3://` URI ending in `/`.
    pub fn to_uri(&self) -> String {
        format!("{S3_SCHEME}://{}/{}", self.bucket, self.prefix)
    }

    /// Returns the object the service writes for `job_id` under this location.
    pub fn result_object(&self, job_id: &str) -> ObjectLocation {
        ObjectLocation {
            bucket: self.bucket.clone(),
            key: format!("{}{}{}", self.prefix, job_id, RESULT_FILE_SUFFIX),
        }
    }
}

impl fmt::Display for OutputLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

/// A single object in S3.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    /// Creates an object location from its parts.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parses an `s3://bucket/key` URI.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let (bucket, key) = split_s3_uri(uri.trim())?;
        if key.is_empty() || key.ends_with('/') {
            return Err(AthenaError::storage(format!(
                "Result location '{uri}' does not name an object"
            )));
        }
        Ok(Self { bucket, key })
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{S3_SCHEME}://{}/{}", self.bucket, self.key)
    }
}

/// Splits an `s3://` URI into its bucket and its path without the leading slash.
fn split_s3_uri(uri: &str) -> Result<(String, String)> {
    let url =
        Url::parse(uri).map_err(|e| AthenaError::config(format!("Invalid S3 location '{uri}': {e}")))?;

    if url.scheme() != S3_SCHEME {
        return Err(AthenaError::config(format!(
            "Invalid scheme '{}' in '{uri}'. Expected 's3'",
            url.scheme()
        )));
    }

    let bucket = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AthenaError::config(format!("Missing bucket in '{uri}'")))?
        .to_string();
    let path = url.path().trim_start_matches('/').to_string();

    Ok((bucket, path))
}
