use edfi_harness_types::{ConnectOptions, HarnessErr, HarnessResult};
use std::time::Duration;

use crate::{ProtonErr, DEFAULT_TIMEOUT};

#[derive(Debug, Clone)]
pub struct ProtonConnectOptions {
    timeout: Option<Duration>,
}

impl Default for ProtonConnectOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ProtonConnectOptions {
    /// Connect and run no timeout on the liveness query.
    pub fn without_timeout() -> Self {
        Self { timeout: None }
    }
}

impl ConnectOptions for ProtonConnectOptions {
    type Error = ProtonErr;

    fn timeout(&self) -> HarnessResult<Duration, ProtonErr> {
        self.timeout.ok_or(HarnessErr::TimeoutNotSet)
    }

    /// Timeout for establishing a connection, and for the liveness query.
    ///
    /// Streaming queries themselves never time out.
    fn set_timeout(&mut self, v: Duration) -> HarnessResult<&mut Self, ProtonErr> {
        self.timeout = Some(v);
        Ok(self)
    }
}
