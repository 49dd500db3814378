//! Shared test helpers: an in-memory transport and archive builder.

#![allow(dead_code)]

use bytes::Bytes;
use futures::{stream, StreamExt};
use repo_retriever::{RequestOptions, Response, Transport, TransportError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use std::collections::HashMap;
use std::future::Future;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ARCHIVE_BASE: &str = "https://github.com";
pub const API_BASE: &str = "https://api.github.com";
pub const RAW_BASE: &str = "https://raw.githubusercontent.com";

/// A canned response.
#[derive(Clone)]
pub struct Route {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Set once the body stream is polled.
    pub polled: Option<Arc<AtomicBool>>,
}

impl Route {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            polled: None,
        }
    }

    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn status(status: StatusCode) -> Self {
        Self::new(status, Bytes::new())
    }

    /// A ZIP download with content type and declared length.
    pub fn zip(archive: Bytes) -> Self {
        let length = archive.len().to_string();
        Self::ok(archive)
            .header(CONTENT_TYPE.as_str(), "application/zip")
            .header(CONTENT_LENGTH.as_str(), &length)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
        self
    }

    pub fn track_polling(mut self, flag: Arc<AtomicBool>) -> Self {
        self.polled = Some(flag);
        self
    }
}

/// In-memory [`Transport`] serving canned routes keyed by full URL.
///
/// Unknown URLs answer 404. Every request is counted.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, Route>>,
    hits: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every response.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn route(&self, url: impl Into<String>, route: Route) {
        self.routes.lock().unwrap().insert(url.into(), route);
    }

    pub fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn hits_matching(&self, fragment: &str) -> usize {
        self.hits
            .lock()
            .unwrap()
            .iter()
            .filter(|(url, _)| url.contains(fragment))
            .map(|(_, count)| count)
            .sum()
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }
}

impl Transport for FakeTransport {
    fn request(
        &self,
        _method: Method,
        url: &str,
        _options: &RequestOptions,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send {
        *self.hits.lock().unwrap().entry(url.to_string()).or_default() += 1;
        let route = self.routes.lock().unwrap().get(url).cloned();
        let url = url.to_string();
        let delay = self.delay;

        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let route = route.unwrap_or_else(|| Route::status(StatusCode::NOT_FOUND));
            if !route.status.is_success() {
                return Err(TransportError::Upstream {
                    url,
                    status: route.status,
                    headers: route.headers,
                    body: String::from_utf8_lossy(&route.body).into_owned(),
                });
            }

            let body = route.body;
            let polled = route.polled;
            let stream = stream::once(async move {
                if let Some(flag) = polled {
                    flag.store(true, Ordering::SeqCst);
                }
                Ok(body)
            })
            .boxed();

            Ok(Response::new(route.status, route.headers, stream))
        }
    }
}

/// Builds a stored (uncompressed) ZIP archive; names ending in `/` become directories.
pub fn build_zip(entries: &[(&str, &[u8])]) -> Bytes {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, data) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
    }
    Bytes::from(writer.finish().unwrap().into_inner())
}

pub fn archive_url(owner: &str, name: &str, branch: &str) -> String {
    format!("{ARCHIVE_BASE}/{owner}/{name}/archive/refs/heads/{branch}.zip")
}

pub fn info_url(owner: &str, name: &str) -> String {
    format!("{API_BASE}/repos/{owner}/{name}")
}

pub fn tree_url(owner: &str, name: &str, branch: &str) -> String {
    format!("{API_BASE}/repos/{owner}/{name}/git/trees/{branch}?recursive=1")
}

pub fn raw_url(owner: &str, name: &str, branch: &str, path: &str) -> String {
    format!("{RAW_BASE}/{owner}/{name}/{branch}/{path}")
}

/// Minimal repository metadata body.
pub fn info_body(owner: &str, name: &str, default_branch: &str, private: bool) -> String {
    format!(
        r#"{{
            "id": 1296269,
            "name": "{name}",
            "full_name": "{owner}/{name}",
            "private": {private},
            "url": "{API_BASE}/repos/{owner}/{name}",
            "html_url": "https://github.com/{owner}/{name}",
            "default_branch": "{default_branch}",
            "language": "Rust",
            "size": 12,
            "stargazers_count": 3,
            "forks_count": 1
        }}"#
    )
}

/// Tree listing body with one blob per `(path, size)`.
pub fn tree_body(blobs: &[(&str, u64)]) -> String {
    let entries: Vec<serde_json::Value> = blobs
        .iter()
        .map(|(path, size)| {
            serde_json::json!({
                "path": path,
                "mode": "100644",
                "type": "blob",
                "sha": "0000000000000000000000000000000000000000",
                "size": size,
            })
        })
        .collect();
    serde_json::json!({ "sha": "root", "tree": entries, "truncated": false }).to_string()
}
