use edfi_harness_types::{HarnessErr, HarnessResult};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderErr {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Database error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("Discovery failed: {0}")]
    Discovery(String),
    #[error("Token request failed: {0}")]
    Token(String),
    #[error("Provisioning failed: {0}")]
    Provision(String),
}

/// Alias for `HarnessResult<T, LoaderErr>`.
pub type LoaderResult<T> = HarnessResult<T, LoaderErr>;

pub(crate) fn loader_err(err: LoaderErr) -> HarnessErr<LoaderErr> {
    HarnessErr::Backend(err)
}
