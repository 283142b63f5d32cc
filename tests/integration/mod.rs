//! Integration tests for athena-fetch.

pub mod fetch_test;
pub mod live_test;
