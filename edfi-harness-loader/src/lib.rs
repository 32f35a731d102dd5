//! ### `edfi-harness-loader`: Batched load tests
//!
//! [`LoadBatcher`] fans a set of [`RequestDescriptor`](edfi_harness_types::RequestDescriptor)s out against a
//! backend, `repetitions` times over, and waits for every request to complete. Each successful request
//! appends `offset,size,elapsed_seconds` to a result log; meanwhile the backend's container is sampled once
//! per repetition with `docker stats`.
//!
//! Both log files are truncated at the start of every run, so a run never mixes with a previous one.
//!
//! Executors for three backends are provided: [`SearchPager`] pages through an OpenSearch index,
//! [`PostgresPager`] pages through a PostgreSQL table, and [`ResourcePager`] pages through a resource of the
//! Ed-Fi API after an OAuth handshake ([`ApiSession`]).
//!
//! This crate runs on `tokio`, as `reqwest` and `sqlx` do.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_debug_implementations)]

/// The default number of items per page when reading a whole resource
pub const DEFAULT_PAGE_SIZE: u64 = 500;

mod batcher;
mod docker;
mod error;
mod http;
mod log_file;
mod postgres;
mod provision;
mod report;
mod scenario;
mod session;

pub use batcher::*;
pub use docker::*;
pub use error::*;
pub use http::*;
pub use log_file::*;
pub use postgres::*;
pub use provision::*;
pub use report::*;
pub use scenario::*;
pub use session::*;

/// Re-export types from `reqwest`
pub mod export {
    pub use reqwest;
    pub use sqlx;
}
