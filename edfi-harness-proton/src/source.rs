use edfi_harness_types::{
    export::futures::{stream::BoxStream, StreamExt},
    HarnessErr, HarnessResult, RawRecord, RecordSource, SourceKey, Timestamp,
};

use crate::{select_all, select_resource, QueryEngine};

#[derive(Debug)]
/// Records of a streaming query: the first column of every row is the payload.
pub struct ProtonSource<Q: QueryEngine> {
    engine: Q,
    query: String,
}

impl<Q: QueryEngine> ProtonSource<Q> {
    pub fn new<S: Into<String>>(engine: Q, query: S) -> Self {
        Self {
            engine,
            query: query.into(),
        }
    }

    /// Every message of `stream`.
    pub fn all(engine: Q, stream: &SourceKey) -> Self {
        Self::new(engine, select_all(stream))
    }

    /// Messages of `stream` carrying documents of `resource`, e.g. `School`.
    pub fn resource(engine: Q, stream: &SourceKey, resource: &str) -> Self {
        Self::new(engine, select_resource(stream, resource))
    }

    pub fn engine(&self) -> &Q {
        &self.engine
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

impl<Q: QueryEngine> RecordSource for ProtonSource<Q> {
    type Error = Q::Error;
    type Stream<'a> = BoxStream<'a, HarnessResult<RawRecord, Q::Error>> where Self: 'a;

    async fn subscribe(&mut self) -> HarnessResult<Self::Stream<'_>, Q::Error> {
        log::debug!("Subscribing to `{}`", self.query);
        let rows = self.engine.execute_iter(&self.query).await?;
        Ok(rows
            .enumerate()
            .map(|(seq, row)| {
                row.and_then(|row| {
                    RawRecord::from_row(seq as u64, Timestamp::now_utc(), row)
                        .map_err(HarnessErr::Decode)
                })
            })
            .boxed())
    }
}
