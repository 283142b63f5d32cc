//! athena-fetch - run SQL on Amazon Athena and fetch the result as a table.
//!
//! ```no_run
//! use athena_fetch::{ClientConfig, QueryClient};
//!
//! # async fn run() -> athena_fetch::Result<()> {
//! let config = ClientConfig::from_env().with_output_location("s3://my-results/athena/");
//! let client = QueryClient::connect(config).await;
//!
//! match client.run_and_fetch("SELECT id, name FROM users").await? {
//!     Some(table) => println!("{} rows", table.row_count()),
//!     None => println!("no results"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod aws;
pub mod client;
pub mod config;
pub mod error;
pub mod location;
pub mod logging;
pub mod service;
pub mod sql;
pub mod storage;
pub mod table;

pub use client::{QueryClient, WaitOptions};
pub use config::ClientConfig;
pub use error::{AthenaError, Result};
pub use service::{ExecutionState, JobId, QueryExecution, SubmitOptions};
pub use table::ResultTable;
