use edfi_harness_runtime::timeout;
use edfi_harness_types::{
    export::{
        futures::{stream::BoxStream, StreamExt},
        serde_json::Value as Json,
        url::Url,
    },
    ConnectOptions, HarnessErr, Row,
};
use reqwest::Client;

use crate::{
    rows::row_stream, stream_err, unavailable, ProtonConnectOptions, ProtonErr, ProtonResult,
    QueryEngine,
};

/// The query every liveness check runs.
pub const LIVENESS_QUERY: &str = "SELECT 'I am alive'";

const ROW_FORMAT: &str = "FORMAT JSONCompactEachRow";

#[derive(Debug, Clone)]
/// A client of Proton's HTTP interface. Cloning is cheap and shares the connection pool.
pub struct ProtonClient {
    http: Client,
    endpoint: Url,
    options: ProtonConnectOptions,
}

impl ProtonClient {
    /// Nothing is sent to the engine until the first query; use [`ProtonClient::ping`] to check it is up.
    pub async fn connect(endpoint: Url, options: ProtonConnectOptions) -> ProtonResult<Self> {
        let mut builder = Client::builder();
        if let Ok(timeout) = options.timeout() {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build().map_err(|e| stream_err(ProtonErr::Http(e)))?;
        Ok(Self {
            http,
            endpoint,
            options,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn options(&self) -> &ProtonConnectOptions {
        &self.options
    }

    /// Run the liveness query, and expect its single row back in time.
    pub async fn ping(&self) -> ProtonResult<()> {
        let check = async {
            let mut rows = self.execute_iter(LIVENESS_QUERY).await?;
            match rows.next().await {
                Some(row) => {
                    let row = row?;
                    log::debug!("{row}");
                    match row.columns().first() {
                        Some(Json::String(s)) if s == "I am alive" => Ok(()),
                        _ => Err(stream_err(ProtonErr::UnexpectedReply(row.to_string()))),
                    }
                }
                None => Err(stream_err(ProtonErr::UnexpectedReply(
                    "no rows".to_owned(),
                ))),
            }
        };
        match self.options.timeout() {
            Ok(limit) => timeout(limit, check).await.map_err(|e| {
                let endpoint = &self.endpoint;
                HarnessErr::StreamUnavailable(format!("{endpoint}: {e}"))
            })?,
            Err(HarnessErr::TimeoutNotSet) => check.await,
            Err(e) => Err(e),
        }
    }

    async fn post(&self, sql: String) -> ProtonResult<reqwest::Response> {
        log::debug!("{sql}");
        let response = self
            .http
            .post(self.endpoint.clone())
            .body(sql)
            .send()
            .await
            .map_err(unavailable)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(stream_err(ProtonErr::Status {
                status: status.as_u16(),
                body: body.trim().to_owned(),
            }));
        }
        Ok(response)
    }
}

/// Drop a trailing `;`, and ask for one JSON array per row.
fn with_row_format(sql: &str) -> String {
    format!("{} {ROW_FORMAT}", sql.trim().trim_end_matches(';').trim_end())
}

impl QueryEngine for ProtonClient {
    type Error = ProtonErr;
    type Rows = BoxStream<'static, ProtonResult<Row>>;

    async fn execute(&self, sql: &str) -> ProtonResult<()> {
        let response = self.post(sql.to_owned()).await?;
        response.bytes().await.map_err(unavailable)?;
        Ok(())
    }

    async fn execute_iter(&self, sql: &str) -> ProtonResult<Self::Rows> {
        let response = self.post(with_row_format(sql)).await?;
        Ok(row_stream(response.bytes_stream()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_row_format() {
        assert_eq!(
            with_row_format("SHOW STREAMS;"),
            "SHOW STREAMS FORMAT JSONCompactEachRow"
        );
        assert_eq!(
            with_row_format("  SELECT * FROM document\n"),
            "SELECT * FROM document FORMAT JSONCompactEachRow"
        );
    }

    #[tokio::test]
    async fn test_unreachable_engine() {
        let endpoint: Url = "http://127.0.0.1:9".parse().unwrap();
        let client = ProtonClient::connect(endpoint, Default::default())
            .await
            .unwrap();
        assert!(matches!(
            client.ping().await,
            Err(HarnessErr::StreamUnavailable(_))
        ));
        assert!(matches!(
            client.execute_iter("SELECT * FROM document").await,
            Err(HarnessErr::StreamUnavailable(_))
        ));
    }
}
