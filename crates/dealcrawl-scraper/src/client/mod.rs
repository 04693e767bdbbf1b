//! HTTP client for product pages.

mod headers;

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use dealcrawl_core::AppConfig;
use reqwest::{Client, StatusCode};

use crate::cache::HttpCache;
use crate::error::ScraperError;
use crate::rate_limit::{pause, retry_with_jitter};
use crate::site::SiteHandler;

/// Fetches product pages the way a browser would.
///
/// Each request waits a random, site-specific delay first. Timeouts,
/// connection failures and HTTP 403 responses are retried up to
/// `max_retries` times after a random pause from `retry_delay`. Successful
/// bodies are kept in an optional file cache.
pub struct PageClient {
    client: Client,
    config: AppConfig,
    cache: Option<Mutex<HttpCache>>,
}

impl PageClient {
    /// Builds a client with the configured timeout and `User-Agent`.
    ///
    /// With `use_cache`, bodies are read from and written to
    /// `config.cache_file`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &AppConfig, use_cache: bool) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.as_str())
            .build()?;

        let cache = use_cache.then(|| {
            Mutex::new(HttpCache::new(
                config.cache_file.clone(),
                config.cache_duration_secs,
            ))
        });

        Ok(Self {
            client,
            config: config.clone(),
            cache,
        })
    }

    /// Returns the page body for `url`, from the cache when possible.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`]: `url` is not an absolute URL.
    /// - [`ScraperError::Forbidden`]: HTTP 403 after all retries.
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status (not retried).
    /// - [`ScraperError::Http`]: network failure after all retries.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        reqwest::Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;

        if let Some(body) = self.cached(url) {
            tracing::debug!(url, "using cached response");
            return Ok(body);
        }

        let handler = SiteHandler::for_url(url);
        let delay = handler.delay_range(&self.config);

        let (status, body) = retry_with_jitter(self.config.max_retries, self.config.retry_delay, || {
            let request = self.client.get(url).headers(headers::headers_for(url, handler));
            async move {
                pause(delay).await;
                let response = request.send().await?;
                let status = response.status();

                if status == StatusCode::FORBIDDEN {
                    return Err(ScraperError::Forbidden { url: url.to_owned() });
                }
                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_owned(),
                    });
                }

                Ok((status, response.text().await?))
            }
        })
        .await?;

        if status == StatusCode::OK {
            self.store(url, &body);
        }
        Ok(body)
    }

    /// Drops `url` from the cache so the next fetch goes to the network.
    pub fn forget(&self, url: &str) {
        if let Some(cache) = &self.cache {
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(url);
        }
    }

    fn cached(&self, url: &str) -> Option<String> {
        self.cache
            .as_ref()?
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
    }

    fn store(&self, url: &str, body: &str) {
        if let Some(cache) = &self.cache {
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .set(url, body);
        }
    }
}
