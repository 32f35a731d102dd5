use std::str::Utf8Error;
use thiserror::Error;

/// Type alias of the [`Result`] type specific to `edfi-harness`.
pub type HarnessResult<T, E> = std::result::Result<T, HarnessErr<E>>;

#[derive(Error, Debug)]
/// Common errors that may occur.
///
/// Only [`HarnessErr::Decode`] is local to a single record; every other variant ends the run it happens in,
/// unless the caller isolates it (the load batcher does so for [`HarnessErr::Request`] by default).
pub enum HarnessErr<E: std::error::Error> {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeErr),
    #[error("Stream unavailable: {0}")]
    StreamUnavailable(String),
    #[error("Request error: {0}")]
    Request(#[from] RequestErr),
    #[error("Stats capture error: {0}")]
    StatsCapture(#[from] StatsErr),
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),
    #[error("Timeout has not yet been set")]
    TimeoutNotSet,
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("SourceUrlErr {0}")]
    SourceUrlErr(#[from] SourceUrlErr),
    #[error("SourceKeyErr {0}")]
    SourceKeyErr(#[from] SourceKeyErr),
    #[error("Backend error: {0}")]
    Backend(E),
    #[error("Runtime error: {0}")]
    Runtime(Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Error, Debug)]
/// Errors that may happen when decoding a record into a document.
pub enum DecodeErr {
    #[error("Utf8Error {0}")]
    Utf8Error(#[from] Utf8Error),
    #[error("serde_json::Error {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Expected a JSON object")]
    NotAnObject,
    #[error("Row has no columns")]
    EmptyRow,
    #[error("Missing field `{0}`")]
    MissingField(String),
    #[error("Field `{0}` has an unexpected type")]
    UnexpectedType(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Errors surfaced by a request executor. Transport failures and non-success statuses are told apart.
pub enum RequestErr {
    #[error("Request to {uri} failed with status {status}: {body}")]
    Status {
        uri: String,
        status: u16,
        body: String,
    },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Error, Debug)]
/// Errors that may happen when capturing a resource snapshot. These are never fatal.
pub enum StatsErr {
    #[error("Failed to spawn stats tool: {0}")]
    Spawn(std::io::Error),
    #[error("Stats tool exited with {status} for `{process}`: {stderr}")]
    ExitStatus {
        process: String,
        status: String,
        stderr: String,
    },
    #[error("Stats tool printed nothing for `{0}`")]
    EmptyOutput(String),
    #[error("Runtime error: {0}")]
    Runtime(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Errors that may happen when building a request descriptor.
pub enum DescriptorErr {
    #[error("Size must be positive")]
    ZeroSize,
    #[error("Expected `offset:size`, found `{0}`")]
    Malformed(String),
}

#[derive(Error, Debug)]
/// Errors that may happen when parsing a source URL
pub enum SourceUrlErr {
    #[error("UrlParseError {0}")]
    UrlParseError(#[from] url::ParseError),
    #[error("SourceKeyErr {0}")]
    SourceKeyErr(#[from] SourceKeyErr),
    #[error("Expected one source key, found zero or more than one")]
    NotOneSourceKey,
    #[error("Protocol is required")]
    ProtocolRequired,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Errors that may happen when handling SourceKey
pub enum SourceKeyErr {
    #[error("Invalid source key: valid pattern is [a-zA-Z0-9._-]{{1, 249}}")]
    InvalidSourceKey,
}

impl<E: std::error::Error> HarnessErr<E> {
    /// Whether this error ends the stream or batch it occurred in.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Decode(_))
    }
}

/// Function to construct a [`HarnessErr::Runtime`] error variant.
pub fn runtime_error<T: std::error::Error, E: std::error::Error + Send + Sync + 'static>(
    e: E,
) -> HarnessErr<T> {
    HarnessErr::Runtime(Box::new(e))
}
