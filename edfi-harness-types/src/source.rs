use futures::{Future, Stream};

use crate::{HarnessResult, RawRecord};

/// Common interface of record sources, to be implemented by all stream backends.
///
/// A subscription is live: it yields records as they arrive, and only ends if the collaborator ends it.
/// Sources are not restartable; subscribe again (if the backend allows it) to start over.
pub trait RecordSource: Send {
    type Error: std::error::Error + Send + 'static;

    type Stream<'a>: Stream<Item = HarnessResult<RawRecord, Self::Error>> + Send + 'a
    where
        Self: 'a;

    /// Start the subscription. Failing to reach the collaborator here is fatal.
    ///
    /// Items of the stream are `Err(HarnessErr::Decode)` for a malformed record, which the consumer
    /// may skip; any other error means the subscription is lost.
    fn subscribe(
        &mut self,
    ) -> impl Future<Output = HarnessResult<Self::Stream<'_>, Self::Error>> + Send;
}
