use futures::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The deadline passed before the future completed.
pub struct TimeoutError {
    after: Duration,
}

impl TimeoutError {
    pub fn after(&self) -> Duration {
        self.after
    }
}

impl std::fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Timed out after {:?}", self.after)
    }
}

impl std::error::Error for TimeoutError {}

/// Run `f` to completion, unless `dur` passes first.
pub async fn timeout<F, T>(dur: Duration, f: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(dur, f)
        .await
        .map_err(|_| TimeoutError { after: dur })
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_timeout() {
        let dur = Duration::from_millis(10);
        assert_eq!(timeout(dur, async { 7 }).await, Ok(7));

        let err = timeout(dur, tokio::time::sleep(Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert_eq!(err.after(), dur);
        assert_eq!(err.to_string(), "Timed out after 10ms");
    }
}
