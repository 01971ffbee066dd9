use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use shared_config::ClientConfig;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, ConfigError};
use crate::response::Response;

/// Query parameters: key to list of values. Keys are encoded in sorted
/// order so the same parameters always produce the same query string.
pub type Params = BTreeMap<String, Vec<String>>;

/// HTTP client for one dependent service.
///
/// Holds the parsed base URL, the configured headers and a
/// [`reqwest::Client`] built with the configured timeout. Each call derives
/// its own request URL from a clone of the base URL, so a `Client` can be
/// shared across tasks (it is cheap to clone and `Send + Sync`).
///
/// Every call issues exactly one request; nothing is retried.
#[derive(Clone)]
pub struct Client {
    inner: reqwest::Client,
    base_url: Url,
    health: String,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

impl Client {
    /// Build a client from its config. Fails if the base URL does not parse
    /// as an absolute URL or a header name or value is invalid.
    pub fn new(conf: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&conf.url).map_err(|source| ConfigError::InvalidUrl {
            url: conf.url.clone(),
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::NotABase(conf.url.clone()).into());
        }

        let headers = header_map(&conf.headers)?;

        let mut builder = reqwest::Client::builder().default_headers(headers.clone());
        if let Some(timeout) = conf.timeout_duration() {
            builder = builder.timeout(timeout);
        }
        let inner = builder.build().map_err(ConfigError::Transport)?;

        Ok(Self {
            inner,
            base_url,
            health: conf.health.clone(),
            headers,
            timeout: conf.timeout_duration(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Path probed by [`is_ready`](Self::is_ready).
    pub fn health(&self) -> &str {
        &self.health
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// GET the health path. `Ok(false)` means the dependency answered with a
    /// non-2xx status; only transport failures are errors.
    pub async fn is_ready(&self) -> Result<bool, ClientError> {
        let resp = self.dispatch(Method::GET, &self.health, None, None, None).await?;
        Ok(resp.is_successful())
    }

    pub async fn is_ready_with_deadline(&self, deadline: Instant) -> Result<bool, ClientError> {
        let resp = self
            .dispatch(Method::GET, &self.health, None, None, Some(deadline))
            .await?;
        Ok(resp.is_successful())
    }

    pub async fn get(&self, path: &str, params: Option<&Params>) -> Result<Response, ClientError> {
        self.dispatch(Method::GET, path, params, None, None).await
    }

    pub async fn get_with_deadline(
        &self,
        deadline: Instant,
        path: &str,
        params: Option<&Params>,
    ) -> Result<Response, ClientError> {
        self.dispatch(Method::GET, path, params, None, Some(deadline))
            .await
    }

    /// POST with an optional JSON body.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        params: Option<&Params>,
        body: Option<&B>,
    ) -> Result<Response, ClientError> {
        let body = encode_body(body)?;
        self.dispatch(Method::POST, path, params, body, None).await
    }

    pub async fn post_with_deadline<B: Serialize + ?Sized>(
        &self,
        deadline: Instant,
        path: &str,
        params: Option<&Params>,
        body: Option<&B>,
    ) -> Result<Response, ClientError> {
        let body = encode_body(body)?;
        self.dispatch(Method::POST, path, params, body, Some(deadline))
            .await
    }

    /// PUT with an optional JSON body.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        params: Option<&Params>,
        body: Option<&B>,
    ) -> Result<Response, ClientError> {
        let body = encode_body(body)?;
        self.dispatch(Method::PUT, path, params, body, None).await
    }

    pub async fn put_with_deadline<B: Serialize + ?Sized>(
        &self,
        deadline: Instant,
        path: &str,
        params: Option<&Params>,
        body: Option<&B>,
    ) -> Result<Response, ClientError> {
        let body = encode_body(body)?;
        self.dispatch(Method::PUT, path, params, body, Some(deadline))
            .await
    }

    pub async fn delete(
        &self,
        path: &str,
        params: Option<&Params>,
    ) -> Result<Response, ClientError> {
        self.dispatch(Method::DELETE, path, params, None, None).await
    }

    pub async fn delete_with_deadline(
        &self,
        deadline: Instant,
        path: &str,
        params: Option<&Params>,
    ) -> Result<Response, ClientError> {
        self.dispatch(Method::DELETE, path, params, None, Some(deadline))
            .await
    }

    /// Build and send one request.
    ///
    /// The deadline, when given, bounds the whole exchange including reading
    /// the body through the returned [`Response`]. The configured timeout
    /// still applies, so whichever is shorter wins.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        params: Option<&Params>,
        body: Option<Vec<u8>>,
        deadline: Option<Instant>,
    ) -> Result<Response, ClientError> {
        let url = self.request_url(path, params);

        let mut builder = self.inner.request(method.clone(), url.clone());
        if let Some(body) = body {
            if !self.headers.contains_key(CONTENT_TYPE) {
                builder = builder.header(CONTENT_TYPE, "application/json");
            }
            builder = builder.body(body);
        }

        // A per-request timeout replaces the client-wide one in reqwest, so
        // apply the deadline only when it is the tighter bound.
        let mut deadline_bound = false;
        if let Some(deadline) = deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(%method, %url, "request deadline already passed");
                return Err(ClientError::DeadlineExceeded {
                    url: url.to_string(),
                });
            }
            if self.timeout.is_none_or(|timeout| remaining < timeout) {
                builder = builder.timeout(remaining);
                deadline_bound = true;
            }
        }
        let request = builder.build().map_err(ClientError::RequestBuild)?;

        debug!(%method, %url, "sending request");
        let resp = self.inner.execute(request).await.map_err(|e| {
            warn!(%method, %url, error = %e, "request failed");
            if deadline_bound && e.is_timeout() {
                ClientError::DeadlineExceeded {
                    url: url.to_string(),
                }
            } else {
                ClientError::Transport(e)
            }
        })?;
        debug!(%method, %url, code = resp.status().as_u16(), "received response");

        Ok(Response::from_transport(method, url, resp, deadline_bound))
    }

    /// The base URL with its path replaced by `path` and its query replaced
    /// by `params`.
    fn request_url(&self, path: &str, params: Option<&Params>) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url.set_fragment(None);
        let query = params.map(encode_query).filter(|q| !q.is_empty());
        url.set_query(query.as_deref());
        url
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("health", &self.health)
            .finish()
    }
}

fn encode_body<B: Serialize + ?Sized>(body: Option<&B>) -> Result<Option<Vec<u8>>, ClientError> {
    body.map(|b| serde_json::to_vec(b))
        .transpose()
        .map_err(ClientError::Encoding)
}

fn encode_query(params: &Params) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, values) in params {
        for value in values {
            query.append_pair(key, value);
        }
    }
    query.finish()
}

fn header_map(headers: &HashMap<String, Vec<String>>) -> Result<HeaderMap, ConfigError> {
    let mut map = HeaderMap::new();
    for (name, values) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        for value in values {
            let value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            map.append(header_name.clone(), value);
        }
    }
    Ok(map)
}
