use edfi_harness_types::{RequestDescriptor, RequestErr, RequestExecutor, Response};
use reqwest::{header, Client, RequestBuilder};
use serde_json::json;

use crate::{ApiSession, LoaderErr, LoaderResult};

#[derive(Debug, Clone)]
/// A pooled HTTP client. Cloning is cheap and shares the pool.
pub struct HttpClient {
    client: Client,
}

#[derive(Debug, Clone, PartialEq)]
/// A successful reply, with its body already classified.
pub struct HttpReply {
    pub status: u16,
    /// The `Location` header, set by the API on resource creation
    pub location: Option<String>,
    pub response: Response,
}

impl HttpClient {
    pub fn new() -> LoaderResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| crate::loader_err(LoaderErr::Http(e)))?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send a request. A status of 400 or above is an error carrying the response body.
    pub async fn invoke(&self, request: RequestBuilder) -> Result<HttpReply, RequestErr> {
        let request = request.build().map_err(transport)?;
        let uri = request.url().to_string();
        let response = self.client.execute(request).await.map_err(transport)?;

        let status = response.status();
        let location = header_value(&response, header::LOCATION);
        let content_type = header_value(&response, header::CONTENT_TYPE);
        let body = response.bytes().await.map_err(transport)?;

        if status.is_client_error() || status.is_server_error() {
            let body = String::from_utf8_lossy(&body).into_owned();
            log::warn!("Request to {uri} failed with status {status}");
            return Err(RequestErr::Status {
                uri,
                status: status.as_u16(),
                body,
            });
        }

        Ok(HttpReply {
            status: status.as_u16(),
            location,
            response: Response::from_body(content_type.as_deref(), &body)?,
        })
    }
}

fn header_value(response: &reqwest::Response, name: header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

fn transport(e: reqwest::Error) -> RequestErr {
    RequestErr::Transport(e.to_string())
}

#[derive(Debug, Clone)]
/// Reads one page of an OpenSearch index per request: `GET {base}/{index}/_search` with `{"from", "size"}`.
pub struct SearchPager {
    http: HttpClient,
    url: String,
}

impl SearchPager {
    pub fn new(http: HttpClient, base_url: &str, index: &str) -> Self {
        Self {
            http,
            url: format!("{}/{index}/_search", base_url.trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RequestExecutor for SearchPager {
    async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Response, RequestErr> {
        let body = json!({ "from": descriptor.offset(), "size": descriptor.size() });
        let request = self.http.client().get(&self.url).json(&body);
        Ok(self.http.invoke(request).await?.response)
    }
}

#[derive(Debug, Clone)]
/// Reads one page of an API resource per request: `GET {data_api}/{resource}?offset=&limit=`.
pub struct ResourcePager {
    http: HttpClient,
    session: ApiSession,
    url: String,
}

impl ResourcePager {
    /// `resource` is relative to the data management API, e.g. `ed-fi/students`.
    pub fn new(http: HttpClient, session: ApiSession, resource: &str) -> Self {
        let url = session.resource_url(resource);
        Self { http, session, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RequestExecutor for ResourcePager {
    async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Response, RequestErr> {
        let request = self
            .http
            .client()
            .get(&self.url)
            .bearer_auth(self.session.token())
            .query(&[("offset", descriptor.offset()), ("limit", descriptor.size())]);
        Ok(self.http.invoke(request).await?.response)
    }
}
