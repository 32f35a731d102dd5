use edfi_harness_types::{
    export::futures::{Future, Stream, StreamExt},
    export::serde_json::Value as Json,
    HarnessResult, Row,
};

use crate::ExternalStream;

/// A SQL engine that can stream the rows of a query back.
pub trait QueryEngine: Send + Sync {
    type Error: std::error::Error + Send + 'static;
    type Rows: Stream<Item = HarnessResult<Row, Self::Error>> + Send + Unpin + 'static;

    /// Run a statement returning no rows.
    fn execute(&self, sql: &str) -> impl Future<Output = HarnessResult<(), Self::Error>> + Send;

    /// Start a query. For a streaming query, the rows never end.
    ///
    /// A row that cannot be parsed is an `Err(HarnessErr::Decode)` item; any other error item ends the rows.
    fn execute_iter(
        &self,
        sql: &str,
    ) -> impl Future<Output = HarnessResult<Self::Rows, Self::Error>> + Send;

    /// Names of the streams known to the engine.
    fn show_streams(&self) -> impl Future<Output = HarnessResult<Vec<String>, Self::Error>> + Send {
        async move {
            let mut rows = self.execute_iter("SHOW STREAMS").await?;
            let mut names = Vec::new();
            while let Some(row) = rows.next().await {
                if let Some(name) = row?.columns().first() {
                    names.push(match name {
                        Json::String(name) => name.to_owned(),
                        other => other.to_string(),
                    });
                }
            }
            Ok(names)
        }
    }

    /// Create the stream if it does not exist yet.
    fn create_external_stream(
        &self,
        stream: &ExternalStream,
    ) -> impl Future<Output = HarnessResult<(), Self::Error>> + Send {
        let sql = stream.to_sql();
        async move { self.execute(&sql).await }
    }
}
