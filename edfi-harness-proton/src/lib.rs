//! ### `edfi-harness-proton`: Proton record source
//!
//! [Proton](https://github.com/timeplus-io/proton) is a streaming SQL engine. It reads the document topic
//! of the platform through an external stream, and this crate subscribes to a streaming query over that
//! stream through Proton's HTTP interface.
//!
//! A streaming query never ends on its own: [`ProtonSource`] yields one [`RawRecord`](edfi_harness_types::RawRecord)
//! per row for as long as the connection lives. Rows are requested as `JSONCompactEachRow`, one JSON array per line.
//!
//! The engine is reached through the [`QueryEngine`] trait, so anything that can run SQL and stream rows
//! back can stand in for it.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_debug_implementations)]

/// The default Proton HTTP port number, for streaming queries
pub const PROTON_PORT: u16 = 8123;

/// The default timeout, if needed but unspecified
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

mod client;
mod ddl;
mod engine;
mod error;
mod options;
mod rows;
mod source;

pub use client::*;
pub use ddl::*;
pub use engine::*;
pub use error::*;
pub use options::*;
pub use source::*;

/// Re-export types from `reqwest`
pub mod export {
    pub use reqwest;
}
