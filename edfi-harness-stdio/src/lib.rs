//! ### `edfi-harness-stdio`: Standard I/O record source
//!
//! Reads one record per line from stdin (or any buffered reader), which makes it easy to replay a capture
//! of the document topic through the validator:
//!
//! ```shell
//! cat documents.ndjson | validate-stdin --source-key document
//! ```
//!
//! A line may start with a `[timestamp | source key | sequence]` prefix, every part being optional.
//! See [`parse_meta`] for the format.
//!
//! + Lines naming another source key are dropped, if [`StdioOptions::set_source_key`] is set
//! + Lines without a sequence number are numbered after the previous record of the same source key
//! + Lines without a timestamp are stamped when read
//!
//! Reading happens on a dedicated thread, so a blocked stdin never holds up the async runtime.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_debug_implementations)]

mod error;
mod options;
mod parser;
mod source;

pub use error::*;
pub use options::*;
pub use parser::*;
pub use source::*;
