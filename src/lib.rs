//! # edfi-harness
//!
//! Tooling to watch and to load an Ed-Fi data platform deployment.
//!
//! ## Features
//!
//! 1. Streaming validation
//!
//! Subscribe to the documents flowing through the platform's Kafka topic (through a streaming query engine,
//! or piped in via stdin), decode each one, and report every document breaking a data-quality rule.
//! The bundled rule checks that every education organization category of a school ends with `#School`.
//!
//! 2. Batched load testing
//!
//! Fan out `repetitions × descriptors` paged reads against a backend, time each of them, append the timings
//! to a per-backend CSV log, and capture `docker stats` snapshots of the backend container while the batch runs.
//!
//! ## Architecture
//!
//! `edfi-harness` is the facade crate re-exporting implementation from a number of sub-crates:
//!
//! + `edfi-harness-types`: the data model, collaborator traits and errors
//! + `edfi-harness-validator`: the stream validator, rules and diagnostic sinks
//! + `edfi-harness-loader`: the load batcher, result logs, resource snapshots, HTTP and PostgreSQL executors,
//!   API provisioning
//! + `edfi-harness-proton`: the streaming query engine client
//! + `edfi-harness-stdio`: records from stdin
//! + `edfi-harness-runtime`: tokio shims for tasks, timeouts and file I/O

#![cfg_attr(docsrs, feature(doc_cfg))]

pub use edfi_harness_types::*;
pub use edfi_harness_validator::*;

#[cfg(feature = "edfi-harness-loader")]
#[cfg_attr(docsrs, doc(cfg(feature = "loader")))]
pub use edfi_harness_loader as loader;

#[cfg(feature = "edfi-harness-proton")]
#[cfg_attr(docsrs, doc(cfg(feature = "proton")))]
pub use edfi_harness_proton as proton;

#[cfg(feature = "edfi-harness-stdio")]
#[cfg_attr(docsrs, doc(cfg(feature = "stdio")))]
pub use edfi_harness_stdio as stdio;

#[cfg(feature = "edfi-harness-runtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "runtime")))]
pub use edfi_harness_runtime as runtime;
