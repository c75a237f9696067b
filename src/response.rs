use std::fmt;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::{ReqwrapError, Result, Session};

/// Response produced by one attempt.
///
/// The body is not buffered: it streams from the open connection. The
/// response keeps its session's connection pool alive until it is dropped or
/// [`closed`](Response::close), so the body stays readable after the session
/// that produced it has been closed.
pub struct Response {
    inner: reqwest::Response,
    attempt: usize,
    _session: Session,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status())
            .field("url", &self.url().as_str())
            .field("attempt", &self.attempt)
            .finish()
    }
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response, attempt: usize, session: Session) -> Self {
        Self {
            inner,
            attempt,
            _session: session,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Final URL, after redirects.
    pub fn url(&self) -> &Url {
        self.inner.url()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.inner.content_length()
    }

    /// One-based number of the attempt that produced this response.
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    /// Reads the full body as text.
    pub async fn text(self) -> Result<String> {
        self.inner.text().await.map_err(ReqwrapError::Body)
    }

    /// Reads the full body as raw bytes.
    pub async fn bytes(self) -> Result<Bytes> {
        self.inner.bytes().await.map_err(ReqwrapError::Body)
    }

    /// Reads the full body and decodes it as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| {
            ReqwrapError::Decode(format!(
                "invalid response JSON: {err}; body: {}",
                String::from_utf8_lossy(&body)
            ))
        })
    }

    /// Streams the next body chunk, or `None` once the body is complete.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        self.inner.chunk().await.map_err(ReqwrapError::Body)
    }

    /// Releases the response and its connection.
    pub fn close(self) {
        tracing::debug!(status = self.status().as_u16(), attempt = self.attempt, "response closed");
    }
}
