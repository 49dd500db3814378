//! Connection-pooled [`Transport`] backed by `reqwest`.

use super::{RequestOptions, Response, Transport, TransportError};
use crate::config::{Credential, RetrievalConfig};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

/// Default `Accept` header for metadata API calls.
const GITHUB_JSON: &str = "application/vnd.github.v3+json";

/// Longest error body kept on [`TransportError::Upstream`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Idle keep-alive connections retained per host.
const MAX_IDLE_PER_HOST: usize = 50;

/// How long an idle pooled connection is kept.
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Production transport.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    default_timeout: Duration,
}

impl HttpTransport {
    /// Builds a pooled client for the given settings.
    ///
    /// The credential, when present, is attached to every request as a
    /// sensitive `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Setup`] if the client cannot be built.
    pub fn new(
        config: &RetrievalConfig,
        credential: Option<&Credential>,
    ) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));

        if let Some(credential) = credential {
            let mut value = HeaderValue::from_str(&format!("token {}", credential.expose()))
                .map_err(|e| TransportError::Setup {
                    message: format!("credential is not a valid header value: {e}"),
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .pool_idle_timeout(IDLE_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Setup {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            default_timeout: config.api_timeout(),
        })
    }
}

impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        debug!(%method, url, "Sending request");

        let mut request = self
            .client
            .request(method, url)
            .timeout(options.timeout.unwrap_or(self.default_timeout));
        if let Some(accept) = options.accept {
            request = request.header(ACCEPT, accept);
        }

        let response = request.send().await.map_err(|e| classify(url, e))?;
        let status = response.status();

        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Upstream {
                url: url.to_string(),
                status,
                headers,
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let headers = response.headers().clone();
        let stream_url = url.to_string();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| classify(&stream_url, e)))
            .boxed();

        Ok(Response::new(status, headers, body))
    }
}

/// Maps a `reqwest` failure onto the transport taxonomy.
fn classify(url: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        TransportError::ConnectionFailure {
            url: url.to_string(),
            message: format!("could not connect: {error}"),
        }
    } else {
        TransportError::ConnectionFailure {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
