//! ### `edfi-harness-validator`: Stream validation
//!
//! Consumes records from any [`RecordSource`](edfi_harness_types::RecordSource), decodes them into documents,
//! checks each document against a [`Rule`], and emits a [`Diagnostic`](edfi_harness_types::Diagnostic)
//! to a [`DiagnosticSink`] for every document that fails.
//!
//! The sequence of diagnostics is lazy and unbounded. A record that cannot be decoded is logged and skipped;
//! losing the source ends the run with an error. Use a [`CancelToken`] to stop it from the outside.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_debug_implementations)]

mod cancel;
mod rule;
mod sink;
mod validator;

pub use cancel::*;
pub use rule::*;
pub use sink::*;
pub use validator::*;
