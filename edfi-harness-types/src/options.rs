use crate::HarnessResult;
use std::time::Duration;

/// Common options of a connection to an external collaborator.
pub trait ConnectOptions: Default + Clone + Send {
    type Error: std::error::Error;

    fn timeout(&self) -> HarnessResult<Duration, Self::Error>;
    fn set_timeout(&mut self, d: Duration) -> HarnessResult<&mut Self, Self::Error>;
}
