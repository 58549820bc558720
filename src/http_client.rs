//! HTTP transport for result store reads
//!
//! Features:
//! - HTTP/2 when the server negotiates it, HTTP/1.1 otherwise
//! - TLS 1.3 via rustls
//! - Brotli and Gzip decompression (auto-negotiated)
//! - Connection pooling with keep-alive
//! - Bounded connect/request timeouts so a hung read cannot stall a poll

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, instrument};

use crate::config::HttpConfig;

/// Shared HTTP client. Construct once and hand to the store client.
#[derive(Debug, Clone)]
pub struct StoreHttpClient {
    client: Client,
}

impl StoreHttpClient {
    /// Create a client with the given timeouts and user agent.
    pub fn new(config: &HttpConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            // ═══════════════════════════════════════════════════════════════
            // CONNECTIONS
            // ═══════════════════════════════════════════════════════════════
            .http2_adaptive_window(true)
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            // ═══════════════════════════════════════════════════════════════
            // TLS
            // ═══════════════════════════════════════════════════════════════
            .use_rustls_tls()
            // ═══════════════════════════════════════════════════════════════
            // COMPRESSION
            // ═══════════════════════════════════════════════════════════════
            .brotli(true)
            .gzip(true)
            // ═══════════════════════════════════════════════════════════════
            // TIMEOUTS
            // ═══════════════════════════════════════════════════════════════
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            // ═══════════════════════════════════════════════════════════════
            // REDIRECTS / IDENTITY
            // ═══════════════════════════════════════════════════════════════
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    /// Issue a GET. Non-2xx statuses are returned, not turned into errors.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> reqwest::Result<Response> {
        let response = self.client.get(url).send().await?;

        debug!(
            status = %response.status(),
            version = ?response.version(),
            "Response received"
        );

        Ok(response)
    }
}
