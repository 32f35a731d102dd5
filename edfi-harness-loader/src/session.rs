use edfi_harness_types::Response;
use serde::{de::DeserializeOwned, Deserialize};

use crate::{loader_err, HttpClient, LoaderErr, LoaderResult};

#[derive(Debug, Clone)]
/// An authenticated session with the Ed-Fi API: where the data lives, and the bearer token to read it with.
pub struct ApiSession {
    data_api: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct Discovery {
    urls: DiscoveryUrls,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscoveryUrls {
    oauth: String,
    data_management_api: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenReply {
    pub(crate) access_token: String,
}

impl ApiSession {
    pub fn new<S: Into<String>, T: Into<String>>(data_api: S, token: T) -> Self {
        let data_api: String = data_api.into();
        Self {
            data_api: data_api.trim_end_matches('/').to_owned(),
            token: token.into(),
        }
    }

    /// Read the token and data URLs from the discovery document at `base_url`, then obtain a token with
    /// the client credentials grant.
    pub async fn connect(
        http: &HttpClient,
        base_url: &str,
        client_id: &str,
        client_secret: &str,
    ) -> LoaderResult<Self> {
        log::debug!("Reading discovery document at {base_url}");
        let reply = http.invoke(http.client().get(base_url)).await?;
        let discovery: Discovery = from_response(reply.response)
            .map_err(|e| loader_err(LoaderErr::Discovery(e)))?;

        log::debug!("Requesting a token at {}", discovery.urls.oauth);
        let request = http
            .client()
            .post(&discovery.urls.oauth)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")]);
        let reply = http.invoke(request).await?;
        let token: TokenReply = from_response(reply.response)
            .map_err(|e| loader_err(LoaderErr::Token(e)))?;

        Ok(Self::new(
            discovery.urls.data_management_api,
            token.access_token,
        ))
    }

    pub fn data_api(&self) -> &str {
        &self.data_api
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// e.g. `ed-fi/students` => `{data_api}/ed-fi/students`
    pub fn resource_url(&self, resource: &str) -> String {
        format!("{}/{}", self.data_api, resource.trim_start_matches('/'))
    }
}

pub(crate) fn from_response<T: DeserializeOwned>(response: Response) -> Result<T, String> {
    match response {
        Response::Json(json) => serde_json::from_value(json).map_err(|e| e.to_string()),
        Response::Text(text) => Err(format!("expected JSON, got `{text}`")),
        Response::Empty => Err("empty response".to_owned()),
    }
}
