use edfi_harness_types::{HarnessErr, HarnessResult};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtonErr {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Query failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),
}

/// Alias for `HarnessResult<T, ProtonErr>`.
pub type ProtonResult<T> = HarnessResult<T, ProtonErr>;

pub(crate) fn stream_err(err: ProtonErr) -> HarnessErr<ProtonErr> {
    HarnessErr::Backend(err)
}

/// The engine could not be reached, or dropped the connection.
pub(crate) fn unavailable(err: reqwest::Error) -> HarnessErr<ProtonErr> {
    HarnessErr::StreamUnavailable(err.to_string())
}
