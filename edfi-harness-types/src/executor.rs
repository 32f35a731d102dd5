use futures::Future;

use crate::{RequestDescriptor, RequestErr, ResourceSnapshot, Response, StatsErr};

/// Turns a request descriptor into one request against a backend.
///
/// Executors are shared by all the concurrent requests of a batch, so they should pool their connections.
pub trait RequestExecutor: Send + Sync + 'static {
    /// Transport failures and non-success statuses must both surface as `Err`.
    fn execute(
        &self,
        descriptor: &RequestDescriptor,
    ) -> impl Future<Output = Result<Response, RequestErr>> + Send;
}

/// Captures the resource usage of a named process, e.g. a docker container.
pub trait ProcessStats: Send + Sync + 'static {
    fn capture(
        &self,
        process: &str,
    ) -> impl Future<Output = Result<ResourceSnapshot, StatsErr>> + Send;
}
