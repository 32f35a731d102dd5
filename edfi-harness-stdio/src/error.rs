use edfi_harness_types::{HarnessErr, HarnessResult};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StdioErr {
    #[error("IO Error: {0}")]
    IoError(std::io::Error),
}

pub type StdioResult<T> = HarnessResult<T, StdioErr>;

pub(crate) fn stream_err(err: StdioErr) -> HarnessErr<StdioErr> {
    HarnessErr::Backend(err)
}
