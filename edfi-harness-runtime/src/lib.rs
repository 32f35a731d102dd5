//! ### `edfi-harness-runtime`: Async runtime shims
//!
//! This crate pins down the few runtime facilities the harness needs (spawning tasks, running blocking
//! work, timeouts and async file I/O) to a single set of signatures, backed by `tokio`. `reqwest` and
//! `sqlx` run on `tokio` as well, so every crate of the harness shares one runtime.

#[cfg(feature = "file")]
pub mod file;
mod task;
mod timeout;

pub use task::*;
pub use timeout::*;
