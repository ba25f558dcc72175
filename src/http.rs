//! Network retrieval with exponential backoff retry logic.
//!
//! Feeds and article pages are fetched through the [`Retrieve`] trait so the
//! pipeline never talks to `reqwest` directly:
//! - [`HttpRetriever`]: the real client, sending a browser-identifying
//!   `User-Agent` with a bounded per-request timeout
//! - [`RetryRetrieve`]: decorator that retries transient failures of any
//!   [`Retrieve`] implementation
//!
//! # Retry Strategy
//!
//! - Only transient failures are retried (transport errors, HTTP 429, HTTP 5xx)
//! - Exponential backoff starting at `base_delay`
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::error::RetrieveError;
use rand::{Rng, rng};
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Trait for fetching the body of a URL as text.
#[allow(async_fn_in_trait)]
pub trait Retrieve {
    /// Fetch `url` and return the response body.
    ///
    /// A non-success HTTP status is an error, not a body.
    async fn retrieve(&self, url: &str) -> Result<String, RetrieveError>;
}

/// `reqwest`-backed [`Retrieve`] implementation.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: Client,
    max_body_bytes: u64,
}

impl HttpRetriever {
    /// Build a client that identifies itself as `user_agent` and gives up on
    /// any single request after `timeout`.
    pub fn new(
        user_agent: &str,
        timeout: StdDuration,
        max_body_bytes: u64,
    ) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,application/rss+xml,application/atom+xml,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            max_body_bytes,
        })
    }
}

impl Retrieve for HttpRetriever {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn retrieve(&self, url: &str) -> Result<String, RetrieveError> {
        let t0 = Instant::now();
        let transport = |source: reqwest::Error| RetrieveError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrieveError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(len) = response.content_length() {
            if len > self.max_body_bytes {
                return Err(RetrieveError::TooLarge {
                    url: url.to_string(),
                    bytes: len,
                    limit: self.max_body_bytes,
                });
            }
        }

        let body = response.text().await.map_err(transport)?;
        if body.len() as u64 > self.max_body_bytes {
            return Err(RetrieveError::TooLarge {
                url: url.to_string(),
                bytes: body.len() as u64,
                limit: self.max_body_bytes,
            });
        }

        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Retrieved"
        );
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`Retrieve`] implementation.
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryRetrieve<T> {
    /// The underlying retriever to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryRetrieve<T>
where
    T: Retrieve,
{
    /// Create a new retry wrapper around an existing [`Retrieve`] implementation.
    ///
    /// # Arguments
    ///
    /// * `inner` - The underlying retriever to wrap
    /// * `max_retries` - Retries after the first attempt (0 disables retrying)
    /// * `base_delay` - Initial delay between retries
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryRetrieve<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryRetrieve")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Retrieve for RetryRetrieve<T>
where
    T: Retrieve,
{
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn retrieve(&self, url: &str) -> Result<String, RetrieveError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.retrieve(url).await {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "retrieve() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let shift = (attempt - 1).min(16) as u32;
                    let mut delay = self.base_delay.saturating_mul(1 << shift);
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "retrieve() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FlakyRetriever, StaticRetriever};
    use super::*;

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let api = RetryRetrieve::new(FlakyRetriever::new(2), 3, StdDuration::from_millis(1));
        let body = api.retrieve("https://example.com/feed").await.unwrap();
        assert_eq!(body, "ok");
        assert_eq!(api.inner.attempts(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let api = RetryRetrieve::new(FlakyRetriever::new(10), 1, StdDuration::from_millis(1));
        let err = api.retrieve("https://example.com/feed").await.unwrap_err();
        assert!(matches!(err, RetrieveError::Status { status: 503, .. }));
        assert_eq!(api.inner.attempts(), 2);
    }

    #[tokio::test]
    async fn test_retry_skips_permanent_failures() {
        let inner = StaticRetriever::new().with_status("https://example.com/gone", 404);
        let api = RetryRetrieve::new(inner, 5, StdDuration::from_millis(1));
        let err = api.retrieve("https://example.com/gone").await.unwrap_err();
        assert!(matches!(err, RetrieveError::Status { status: 404, .. }));
        assert_eq!(api.inner.calls().len(), 1);
    }

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(response: String) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        });
        format!("http://{addr}/feed.xml")
    }

    fn client(max_body_bytes: u64) -> HttpRetriever {
        HttpRetriever::new("Mozilla/5.0", StdDuration::from_secs(10), max_body_bytes).unwrap()
    }

    #[tokio::test]
    async fn test_http_retriever_returns_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/rss+xml\r\nContent-Length: 11\r\nConnection: close\r\n\r\n<rss></rss>"
                .to_string(),
        )
        .await;
        assert_eq!(client(1024).retrieve(&url).await.unwrap(), "<rss></rss>");
    }

    #[tokio::test]
    async fn test_http_retriever_maps_error_status() {
        let url = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 4\r\nConnection: close\r\n\r\nbusy"
                .to_string(),
        )
        .await;
        let err = client(1024).retrieve(&url).await.unwrap_err();
        assert!(matches!(err, RetrieveError::Status { status: 503, .. }));
        assert!(err.is_transient());

        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
        )
        .await;
        let err = client(1024).retrieve(&url).await.unwrap_err();
        assert!(matches!(err, RetrieveError::Status { status: 404, .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_http_retriever_rejects_declared_oversize_body() {
        let body = "x".repeat(2000);
        let url = serve_once(format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ))
        .await;
        let err = client(1024).retrieve(&url).await.unwrap_err();
        assert!(matches!(
            err,
            RetrieveError::TooLarge {
                bytes: 2000,
                limit: 1024,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_http_retriever_rejects_undeclared_oversize_body() {
        let body = "x".repeat(2000);
        let url = serve_once(format!(
            "HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n{body}"
        ))
        .await;
        let err = client(1024).retrieve(&url).await.unwrap_err();
        assert!(matches!(
            err,
            RetrieveError::TooLarge {
                bytes: 2000,
                limit: 1024,
                ..
            }
        ));
    }
}
