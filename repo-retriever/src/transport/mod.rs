//! Upstream request plumbing.
//!
//! [`Transport`] is the only seam through which the retrievers talk to the
//! network. It never retries and never touches quota state; callers decide
//! what a failure means.

mod error;
mod http;

pub use error::{BodyError, TransportError};
pub use http::HttpTransport;

use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Streaming response body.
pub type BodyStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Per-request knobs.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Overrides the client's default deadline.
    pub timeout: Option<Duration>,
    /// Overrides the default `Accept` header.
    pub accept: Option<&'static str>,
}

impl RequestOptions {
    /// Options with a specific deadline.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            accept: None,
        }
    }

    /// Sets the `Accept` header.
    #[must_use]
    pub fn accept(mut self, accept: &'static str) -> Self {
        self.accept = Some(accept);
        self
    }
}

/// A successful (2xx) upstream response with an unread body.
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: BodyStream,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl Response {
    /// Assembles a response from its parts.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: BodyStream) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Declared `Content-Length`, if present and numeric.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok())
    }

    /// Declared `Content-Type`, if present.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Splits off the headers and body stream.
    #[must_use]
    pub fn into_parts(self) -> (HeaderMap, BodyStream) {
        (self.headers, self.body)
    }

    /// Drains the body, failing as soon as the running total passes `limit`.
    ///
    /// The running total is checked per chunk, independently of any declared
    /// length, so a missing or understated `Content-Length` cannot smuggle an
    /// oversized body through.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::TooLarge`] past the ceiling, or the stream's
    /// transport error.
    pub async fn collect_limited(self, limit: u64) -> Result<Bytes, BodyError> {
        let mut body = self.body;
        let mut buffer = BytesMut::new();
        let mut observed: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            observed += chunk.len() as u64;
            if observed > limit {
                return Err(BodyError::TooLarge { limit, observed });
            }
            buffer.extend_from_slice(&chunk);
        }

        Ok(buffer.freeze())
    }
}

/// Plain request/response access to the upstream.
///
/// Implementations map non-2xx answers to [`TransportError::Upstream`] and
/// connection problems to the other variants; they must not retry.
pub trait Transport: Send + Sync {
    /// Issues one request.
    fn request(
        &self,
        method: Method,
        url: &str,
        options: &RequestOptions,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send;

    /// Issues one `GET` request.
    fn get(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send {
        self.request(Method::GET, url, options)
    }
}

impl<T: Transport> Transport for Arc<T> {
    fn request(
        &self,
        method: Method,
        url: &str,
        options: &RequestOptions,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send {
        (**self).request(method, url, options)
    }
}

/// Appends percent-encoded path segments to a base URL.
///
/// Returns `None` if the base is unparsable or cannot carry a path.
pub(crate) fn endpoint<I>(base: &str, segments: I) -> Option<Url>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut url = Url::parse(base).ok()?;
    url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
    Some(url)
}
