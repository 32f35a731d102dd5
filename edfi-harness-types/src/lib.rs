//! # edfi-harness types
//!
//! This crate defines the data model and the collaborator traits of the harness, but does not provide any implementation.
//!
//! There are two independent pipelines sharing these types:
//!
//! + the stream validator reads [`RawRecord`]s from a [`RecordSource`], decodes them into [`Document`]s
//!   and reports a [`Diagnostic`] for every document breaking a rule
//! + the load batcher turns [`RequestDescriptor`]s into requests through a [`RequestExecutor`], records a
//!   [`BatchResult`] per request and a [`ResourceSnapshot`] of the backend through [`ProcessStats`]

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_debug_implementations)]

mod document;
mod error;
mod executor;
mod key;
mod load;
mod options;
mod record;
mod source;
mod source_url;

pub use document::*;
pub use error::*;
pub use executor::*;
pub use key::*;
pub use load::*;
pub use options::*;
pub use record::*;
pub use source::*;
pub use source_url::*;

pub mod export;
