use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ClientError;

#[derive(Debug)]
enum Body {
    /// Still on the wire.
    Unread(reqwest::Response),
    /// Drained and cached.
    Read(Bytes),
}

/// The result of one completed HTTP exchange.
///
/// Any status code, including 4xx and 5xx, produces a `Response`; use the
/// classification helpers to decide what it means.
///
/// # Body policy
///
/// The body is read lazily and cached: the first call to
/// [`body_bytes`](Self::body_bytes), [`body_string`](Self::body_string) or
/// [`json`](Self::json) drains the transport stream, and every later call
/// returns the same cached bytes. If draining fails the error is returned
/// once and the body is treated as empty afterwards. To consume the body as
/// a stream instead, use [`into_stream`](Self::into_stream), which takes the
/// response by value so the stream can only be produced once.
#[derive(Debug)]
pub struct Response {
    status: String,
    code: u16,
    method: Method,
    url: Option<Url>,
    headers: HeaderMap,
    body: Body,
    /// The body is bounded by a call deadline rather than the client timeout.
    deadline_bound: bool,
}

impl Response {
    pub(crate) fn from_transport(
        method: Method,
        url: Url,
        resp: reqwest::Response,
        deadline_bound: bool,
    ) -> Self {
        let code = resp.status().as_u16();
        Self {
            status: status_text(code),
            code,
            method,
            url: Some(url),
            headers: resp.headers().clone(),
            body: Body::Unread(resp),
            deadline_bound,
        }
    }

    /// Build an already-read response, for test doubles.
    pub fn from_parts(code: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status: status_text(code),
            code,
            body: Body::Read(body.into()),
            ..Self::default()
        }
    }

    /// Status line text, e.g. `"200 OK"`.
    ///
    /// Built from the code and its canonical reason phrase, not from the
    /// phrase the server sent. Codes without a canonical reason (e.g. `299`)
    /// yield just the number.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Numeric status code. Zero for a default-constructed response.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Method of the originating request.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// URL of the originating request, for diagnostics.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// `199 < code < 300`
    pub fn is_successful(&self) -> bool {
        self.code > 199 && self.code < 300
    }

    /// `399 < code < 500`
    pub fn is_client_error(&self) -> bool {
        self.code > 399 && self.code < 500
    }

    /// `499 < code < 600`
    pub fn is_server_error(&self) -> bool {
        self.code > 499 && self.code < 600
    }

    /// The full body. Drains the transport on first call, then returns the
    /// cached bytes.
    pub async fn body_bytes(&mut self) -> Result<Bytes, ClientError> {
        let bytes = match std::mem::replace(&mut self.body, Body::Read(Bytes::new())) {
            Body::Read(bytes) => bytes,
            Body::Unread(resp) => {
                let read = resp.bytes().await;
                read.map_err(|e| body_error(e, self.deadline_bound, self.url.as_ref()))?
            }
        };
        self.body = Body::Read(bytes.clone());
        Ok(bytes)
    }

    /// The full body decoded as UTF-8, with invalid sequences replaced.
    pub async fn body_string(&mut self) -> Result<String, ClientError> {
        let bytes = self.body_bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Deserialize the full body as JSON.
    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T, ClientError> {
        let bytes = self.body_bytes().await?;
        serde_json::from_slice(&bytes).map_err(ClientError::Decoding)
    }

    /// Consume the response and stream whatever body has not been read.
    /// A body already cached by `body_bytes` is yielded as a single chunk.
    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes, ClientError>> {
        match self.body {
            Body::Unread(resp) => {
                let (deadline_bound, url) = (self.deadline_bound, self.url);
                resp.bytes_stream()
                    .map(move |chunk| {
                        chunk.map_err(|e| body_error(e, deadline_bound, url.as_ref()))
                    })
                    .boxed()
            }
            Body::Read(bytes) if bytes.is_empty() => stream::empty().boxed(),
            Body::Read(bytes) => stream::iter([Ok(bytes)]).boxed(),
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: String::new(),
            code: 0,
            method: Method::GET,
            url: None,
            headers: HeaderMap::new(),
            body: Body::Read(Bytes::new()),
            deadline_bound: false,
        }
    }
}

fn body_error(err: reqwest::Error, deadline_bound: bool, url: Option<&Url>) -> ClientError {
    if deadline_bound && err.is_timeout() {
        ClientError::DeadlineExceeded {
            url: url.map(|u| u.to_string()).unwrap_or_default(),
        }
    } else {
        ClientError::Body(err)
    }
}

fn status_text(code: u16) -> String {
    let reason = reqwest::StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason());
    match reason {
        Some(reason) => format!("{code} {reason}"),
        None => code.to_string(),
    }
}
