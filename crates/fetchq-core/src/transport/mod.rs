//! HTTP transport built on the curl crate (libcurl).
//!
//! Each admitted request runs a blocking GET on its own named thread and
//! reports through its [`Completion`] exactly once: the decoded payload on a
//! 2xx response, a [`TaskError`] otherwise. The admission controller never
//! sees any of this beyond the completion.

mod decode;
mod headers;

use anyhow::{Context, Result};
use std::str;
use std::thread;
use std::time::Duration;
use url::Url;

use crate::config::TransportConfig;
use crate::task::{Completion, Operation, TaskError, TaskResult};

pub use decode::{AcceptContentTypes, BodyDigest, Decode, RawBody, Sha256Body};

/// A finished 2xx response.
#[derive(Debug, Clone)]
pub struct Response {
    /// Effective URL after redirects.
    pub url: String,
    pub status: u32,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Builds request operations sharing one transport configuration.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    config: TransportConfig,
}

impl CurlTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Prepare a GET for `url`. Only http and https URLs are accepted.
    pub fn request<D: Decode>(&self, url: &str, decoder: D) -> Result<HttpOperation<D>> {
        let url = Url::parse(url).with_context(|| format!("invalid URL: {}", url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("unsupported URL scheme: {}", url.scheme());
        }
        Ok(HttpOperation {
            url,
            config: self.config.clone(),
            decoder,
        })
    }
}

/// One pending GET, ready to be submitted to an admission controller.
#[derive(Debug)]
pub struct HttpOperation<D> {
    url: Url,
    config: TransportConfig,
    decoder: D,
}

impl<D> HttpOperation<D> {
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl<D: Decode> Operation for HttpOperation<D> {
    type Output = D::Output;

    fn start(self: Box<Self>, completion: Completion<D::Output>) {
        let id = completion.id();
        let spawned = thread::Builder::new()
            .name(format!("fetchq-task-{}", id.get()))
            .spawn(move || {
                let HttpOperation {
                    url,
                    config,
                    decoder,
                } = *self;
                tracing::debug!(task = %id, %url, "GET");
                let result = perform(&url, &config).and_then(|response| decoder.decode(response));
                if let Err(ref e) = result {
                    tracing::debug!(task = %id, %url, error = %e, "request failed");
                }
                completion.finish(result);
            });
        // On spawn failure the closure, and with it the completion, is
        // dropped, which reports the task as abandoned.
        if let Err(e) = spawned {
            tracing::warn!(task = %id, "could not spawn transport thread: {}", e);
        }
    }
}

/// Blocking GET into memory. Runs on the operation's own thread.
fn perform(url: &Url, config: &TransportConfig) -> TaskResult<Response> {
    let mut header_lines: Vec<String> = Vec::new();
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url.as_str())?;
    easy.follow_location(config.follow_redirects)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(Duration::from_secs(config.connect_timeout_secs))?;
    if config.timeout_secs > 0 {
        easy.timeout(Duration::from_secs(config.timeout_secs))?;
    }
    if let Some(ua) = &config.user_agent {
        easy.useragent(ua)?;
    }

    let mut list = curl::easy::List::new();
    for (k, v) in &config.headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    if !config.headers.is_empty() {
        easy.http_headers(list)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                header_lines.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    if !(200..300).contains(&status) {
        return Err(TaskError::Http(status));
    }
    let effective_url = easy
        .effective_url()?
        .map(str::to_string)
        .unwrap_or_else(|| url.to_string());

    Ok(Response {
        url: effective_url,
        status,
        content_type: headers::content_type(&header_lines),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_http_and_https() {
        let transport = CurlTransport::default();
        let op = transport.request("https://example.com/a.png", RawBody).unwrap();
        assert_eq!(op.url().as_str(), "https://example.com/a.png");
        assert!(transport.request("http://127.0.0.1:8080/", RawBody).is_ok());
    }

    #[test]
    fn request_rejects_bad_urls() {
        let transport = CurlTransport::default();
        assert!(transport.request("not a url", RawBody).is_err());
        let err = transport.request("ftp://example.com/file", RawBody).unwrap_err();
        assert!(err.to_string().contains("ftp"));
    }

    #[test]
    fn request_carries_transport_config() {
        let mut cfg = TransportConfig::default();
        cfg.user_agent = Some("fetchq/0.1".into());
        let transport = CurlTransport::new(cfg.clone());
        assert_eq!(transport.config(), &cfg);
    }
}
