// ABOUTME: Page fetching: the Fetcher trait and its reqwest-backed HttpFetcher.
// ABOUTME: Handles SSRF protection, content-length limits, non-2xx rejection and charset decoding.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use ipnet::{Ipv4Net, Ipv6Net};
use once_cell::sync::Lazy;
use tracing::debug;
use url::Url;

use crate::error::ScrapeError;
use crate::options::Options;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Fetches page content by URL.
///
/// Every transport failure is reported as a [`ScrapeError`]; the batch
/// runner treats all of them as a failed fetch for that URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

static PRIVATE_V4: Lazy<Vec<Ipv4Net>> = Lazy::new(|| {
    ["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16", "127.0.0.0/8", "169.254.0.0/16"]
        .iter()
        .filter_map(|net| net.parse().ok())
        .collect()
});

static PRIVATE_V6: Lazy<Vec<Ipv6Net>> = Lazy::new(|| {
    ["fc00::/7", "fe80::/10"]
        .iter()
        .filter_map(|net| net.parse().ok())
        .collect()
});

/// Check if an IP address is in a private/reserved range.
pub(crate) fn is_private_ip(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(ip) => PRIVATE_V4.iter().any(|net| net.contains(ip)),
        IpAddr::V6(ip) => ip.is_loopback() || PRIVATE_V6.iter().any(|net| net.contains(ip)),
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
/// True when a declared `Content-Length` is over [`MAX_CONTENT_LENGTH`].
fn declared_length_too_large(len: u64) -> bool {
    len > MAX_CONTENT_LENGTH as u64
}

fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(charset) = content_type.and_then(extract_charset) {
        if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
            let (decoded, _, _) = encoding.decode(body);
            return decoded.into_owned();
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        if let Some(charset) = part.trim().strip_prefix("charset=") {
            return Some(charset.trim_matches('"').trim_matches('\'').to_string());
        }
    }
    None
}

/// Fetcher backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    headers: HashMap<String, String>,
    allow_private_networks: bool,
}

impl HttpFetcher {
    /// Builds a fetcher from runner options, reusing `opts.http_client` when set.
    pub fn new(opts: &Options) -> Result<Self, ScrapeError> {
        let client = match opts.http_client.clone() {
            Some(client) => client,
            None => build_client(opts.timeout, &opts.user_agent)?,
        };
        Ok(Self {
            client,
            headers: opts.headers.clone(),
            allow_private_networks: opts.allow_private_networks,
        })
    }

    async fn check_host(&self, url: &str, target: &Url, op: &str) -> Result<(), ScrapeError> {
        if self.allow_private_networks {
            return Ok(());
        }
        let Some(host) = target.host_str() else {
            return Ok(());
        };
        let host = host.trim_start_matches('[').trim_end_matches(']');

        if let Ok(ip) = host.parse::<IpAddr>() {
            if is_private_ip(&ip) {
                return Err(ScrapeError::ssrf(
                    url,
                    op,
                    Some(anyhow::anyhow!("private IP addresses are not allowed")),
                ));
            }
            return Ok(());
        }

        let port = target.port_or_known_default().unwrap_or(80);
        let addrs = tokio::net::lookup_host((host, port)).await.map_err(|e| {
            ScrapeError::fetch(url, op, Some(anyhow::anyhow!("DNS lookup failed: {}", e)))
        })?;
        for socket_addr in addrs {
            if is_private_ip(&socket_addr.ip()) {
                return Err(ScrapeError::ssrf(
                    url,
                    op,
                    Some(anyhow::anyhow!("private IP addresses are not allowed")),
                ));
            }
        }
        Ok(())
    }
}

fn build_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client, ScrapeError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .map_err(|e| {
            ScrapeError::unexpected(
                "",
                "BuildClient",
                Some(anyhow::anyhow!("failed to build HTTP client: {}", e)),
            )
        })
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        if url.is_empty() {
            return Err(ScrapeError::invalid_url(url, "Fetch", None));
        }

        let parsed_url = Url::parse(url).map_err(|e| {
            ScrapeError::invalid_url(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
        })?;

        let scheme = parsed_url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ScrapeError::invalid_url(
                url,
                "Fetch",
                Some(anyhow::anyhow!("scheme must be http or https")),
            ));
        }

        self.check_host(url, &parsed_url, "Fetch").await?;

        let mut request = self.client.get(url);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        debug!(url, "fetching page");
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ScrapeError::timeout(url, "Fetch", Some(anyhow::anyhow!("request timed out: {}", e)))
            } else {
                ScrapeError::fetch(url, "Fetch", Some(anyhow::anyhow!("request failed: {}", e)))
            }
        })?;

        // redirects may land somewhere the original host check never saw
        let final_url = response.url().clone();
        self.check_host(url, &final_url, "Fetch").await?;

        if let Some(len) = response.content_length() {
            if declared_length_too_large(len) {
                return Err(ScrapeError::fetch(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!("content too large")),
                ));
            }
        }

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("HTTP status {}", status.as_u16())),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                ScrapeError::timeout(url, "Fetch", Some(anyhow::anyhow!("body timed out: {}", e)))
            } else {
                ScrapeError::fetch(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!("failed to read body: {}", e)),
                )
            }
        })?;

        if body.len() > MAX_CONTENT_LENGTH {
            return Err(ScrapeError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        }

        debug!(url, status = status.as_u16(), bytes = body.len(), "fetched page");
        Ok(decode_body(&body, content_type.as_deref()))
    }
}
