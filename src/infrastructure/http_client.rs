//! HTTP client for search-result pages
//!
//! A single reqwest client presenting a mobile browser identity. Every page
//! request waits a randomized interval first and is attempted exactly once.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, header};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::TrackerError;
use crate::infrastructure::config::{DelayWindow, FetchConfig, SiteConfig};

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Accept-Language header value
    pub accept_language: String,
    /// Randomized wait before each request
    pub page_delay: DelayWindow,
    /// Whether to follow redirects
    pub follow_redirects: bool,
}

impl HttpClientConfig {
    /// Create HttpClientConfig from the fetch section
    pub fn from_fetch_config(fetch: &FetchConfig) -> Self {
        Self {
            timeout_seconds: fetch.timeout_seconds,
            user_agent: fetch.user_agent.clone(),
            accept_language: fetch.accept_language.clone(),
            page_delay: fetch.page_delay,
            follow_redirects: true,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_fetch_config(&FetchConfig::default())
    }
}

/// HTTP client with mobile identity and request pacing
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self, TrackerError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .default_headers(Self::browser_headers(&config)?)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| TrackerError::config("fetch", format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Headers a mobile browser sends on a top-level navigation
    fn browser_headers(config: &HttpClientConfig) -> Result<header::HeaderMap, TrackerError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_str(&config.accept_language)
                .map_err(|e| TrackerError::config("fetch.accept_language", e.to_string()))?,
        );
        headers.insert(header::CONNECTION, header::HeaderValue::from_static("keep-alive"));
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            header::HeaderValue::from_static("1"),
        );
        Ok(headers)
    }

    pub const fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Fetch a page body as a string after the pacing delay.
    ///
    /// Non-success status codes and network failures both map to
    /// [`TrackerError::Transport`].
    pub async fn fetch_html_string(&self, url: &str) -> Result<String, TrackerError> {
        if !self.config.page_delay.is_zero() {
            let delay = self.config.page_delay.sample();
            debug!("⏳ Waiting {:?} before request", delay);
            sleep(delay).await;
        }

        info!("🌐 HTTP GET: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TrackerError::transport(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("❌ HTTP error {}: {}", status, url);
            return Err(TrackerError::http_status(url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TrackerError::transport(url, format!("Failed to read response body: {e}")))?;

        debug!("✅ Received {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

/// Search-results URL for a keyword and 1-based page number
pub fn search_url(site: &SiteConfig, keyword: &str, page: u32) -> Result<String, TrackerError> {
    let base = format!("{}{}", site.base_url.trim_end_matches('/'), site.search_path);
    let mut url = Url::parse(&base).map_err(|e| TrackerError::config("site.base_url", e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("searchtext", keyword)
        .append_pair("page", &page.to_string());
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_keyword_and_page() {
        let url = search_url(&SiteConfig::default(), "lenor geurbooster", 3).unwrap();
        assert_eq!(
            url,
            "https://www.bol.com/nl/nl/s/?searchtext=lenor+geurbooster&page=3"
        );
    }

    #[test]
    fn search_url_rejects_relative_base() {
        let site = SiteConfig {
            base_url: "not a url".into(),
            ..SiteConfig::default()
        };
        assert!(matches!(search_url(&site, "x", 1), Err(TrackerError::Config { .. })));
    }

    #[test]
    fn client_builds_with_defaults() {
        let client = HttpClient::with_config(HttpClientConfig::default()).unwrap();
        assert!(client.config().user_agent.contains("iPhone"));
    }

    #[test]
    fn invalid_header_value_is_a_config_error() {
        let config = HttpClientConfig {
            accept_language: "bad\nvalue".into(),
            ..HttpClientConfig::default()
        };
        assert!(HttpClient::with_config(config).is_err());
    }

    /// Serve one canned HTTP/1.1 response on a local port and return a search URL for it
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/nl/nl/s/?searchtext=lenor&page=1")
    }

    fn undelayed_client() -> HttpClient {
        HttpClient::with_config(HttpClientConfig {
            page_delay: DelayWindow::none(),
            ..HttpClientConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn service_unavailable_is_a_transport_error_with_status() {
        let url = serve_once("503 Service Unavailable", "busy").await;

        let result = undelayed_client().fetch_html_string(&url).await;

        match result {
            Err(TrackerError::Transport { status, url: failed, .. }) => {
                assert_eq!(status, Some(503));
                assert_eq!(failed, url);
            }
            other => panic!("expected a transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_returns_the_body() {
        let url = serve_once("200 OK", "<html>ok</html>").await;

        let body = undelayed_client().fetch_html_string(&url).await.unwrap();

        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error_without_status() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let result = undelayed_client().fetch_html_string(&url).await;

        assert!(matches!(result, Err(TrackerError::Transport { status: None, .. })));
    }
}
