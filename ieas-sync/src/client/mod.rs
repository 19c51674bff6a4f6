//! Authenticated catalog clients
//!
//! One [`AuthClient`] carries the base URL and a [`Credential`] strategy and
//! injects the credential into every outbound call. [`LibraryClient`] (Eagle)
//! and [`ServerClient`] (Immich) are thin typed layers on top of it.

pub mod library;
pub mod server;

pub use library::LibraryClient;
pub use server::ServerClient;

use ieas_common::{Error, Result};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("ieas-sync/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// How the credential travels with each request
#[derive(Debug, Clone)]
pub enum Credential {
    /// `token` query parameter on GET/DELETE and for non-object bodies;
    /// top-level `token` field in JSON object bodies otherwise (Eagle)
    QueryToken { token: String },
    /// Fixed request header (Immich `x-api-key`)
    Header { name: HeaderName, value: HeaderValue },
}

impl Credential {
    pub fn query_token(token: impl Into<String>) -> Self {
        Credential::QueryToken { token: token.into() }
    }

    pub fn header(name: &'static str, value: &str) -> Result<Self> {
        let mut value = HeaderValue::from_str(value)
            .map_err(|e| Error::Config(format!("invalid {} header value: {}", name, e)))?;
        value.set_sensitive(true);
        Ok(Credential::Header {
            name: HeaderName::from_static(name),
            value,
        })
    }
}

/// HTTP client for general catalog calls (pooled, 30 s per request)
pub fn default_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(Error::Http)
}

/// HTTP client for streamed transfers
///
/// Keeps no idle connections, so every request opens its own upstream
/// connection. Only the connect phase is bounded; bodies may take as long
/// as the transfer needs.
pub fn streaming_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .pool_max_idle_per_host(0)
        .build()
        .map_err(Error::Http)
}

/// Credential-injecting HTTP client bound to one catalog
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl AuthClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, credential: Credential) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            credential,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and decode the JSON response
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self.send(Method::GET, path, query, None).await?;
        decode(path, check_status(response).await?).await
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        let response = self.send(Method::POST, path, &[], Some(body)).await?;
        decode(path, check_status(response).await?).await
    }

    /// PUT a JSON body, ignoring the response body
    pub async fn put(&self, path: &str, body: Value) -> Result<()> {
        let response = self.send(Method::PUT, path, &[], Some(body)).await?;
        check_status(response).await.map(|_| ())
    }

    /// PATCH a JSON body, ignoring the response body
    pub async fn patch(&self, path: &str, body: Value) -> Result<()> {
        let response = self.send(Method::PATCH, path, &[], Some(body)).await?;
        check_status(response).await.map(|_| ())
    }

    /// DELETE with an optional JSON body, ignoring the response body
    pub async fn delete(&self, path: &str, body: Option<Value>) -> Result<()> {
        let response = self.send(Method::DELETE, path, &[], body).await?;
        check_status(response).await.map(|_| ())
    }

    /// Send a request without interpreting the status
    ///
    /// Only transport failures are errors; callers decide what to do with
    /// non-success responses.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<Response> {
        let response = self.request(method, path, query, body).send().await?;
        Ok(response)
    }

    /// Build an authorized request
    pub fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(method = %method, url = %url, "Catalog request");

        // GET and DELETE carry the token in the query string even with a body
        let token_in_body = !matches!(method, Method::GET | Method::DELETE);
        let request = self.http.request(method, url).query(query);

        match (&self.credential, body) {
            (Credential::QueryToken { token }, Some(Value::Object(mut map))) if token_in_body => {
                map.insert("token".to_string(), Value::String(token.clone()));
                request.json(&Value::Object(map))
            }
            (Credential::QueryToken { token }, body) => {
                with_json(request.query(&[("token", token.as_str())]), body)
            }
            (Credential::Header { name, value }, body) => {
                with_json(request.header(name.clone(), value.clone()), body)
            }
        }
    }
}

fn with_json(request: RequestBuilder, body: Option<Value>) -> RequestBuilder {
    match body {
        Some(body) => request.json(&body),
        None => request,
    }
}

/// Turn a non-success response into [`Error::Upstream`]
pub async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::Upstream {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Decode(format!("{}: {}", path, e)))
}
