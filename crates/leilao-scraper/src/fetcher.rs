//! Page-retrieval capability and its HTTP implementation.
//!
//! Adapters depend on [`PageFetcher`], not on `reqwest`, so tests can
//! substitute a canned fetcher and the pipeline stays free of transport
//! detail.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::FetchError;
use crate::retry::retry_with_backoff;

/// An opaque page-retrieval capability.
///
/// Implementations return the raw response body for a URL. Failure modes are
/// limited to the [`FetchError`] taxonomy; anything per-item is the caller's
/// problem.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Retrieves the body at `url` via GET.
    ///
    /// # Errors
    ///
    /// See [`FetchError`].
    async fn get(&self, url: &str) -> Result<String, FetchError>;

    /// Sends `body` as JSON via POST and returns the response body.
    ///
    /// # Errors
    ///
    /// See [`FetchError`].
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, FetchError>;
}

/// `reqwest`-backed [`PageFetcher`] with timeout, `User-Agent`, and bounded
/// retry on transient errors.
///
/// Transient errors (network failures, 5xx) are retried with exponential
/// backoff up to `max_retries` additional attempts. HTTP 429 surfaces as
/// [`FetchError::RateLimited`] with the server's `Retry-After` value and is
/// not retried here.
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl HttpFetcher {
    /// Creates an `HttpFetcher` with configured timeout, `User-Agent`, and
    /// retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    async fn execute(&self, request: reqwest::RequestBuilder, url: &str) -> Result<String, FetchError> {
        let response = request
            .header(
                reqwest::header::ACCEPT,
                "application/json, text/html;q=0.9, */*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "pt-BR,pt;q=0.9,en;q=0.5")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(FetchError::RateLimited {
                domain: extract_domain(url),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async {
            self.execute(self.client.get(url), url).await
        })
        .await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, FetchError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async {
            self.execute(self.client.post(url).json(body), url).await
        })
        .await
    }
}

/// Strips scheme and path from a URL, leaving the host for error messages.
pub(crate) fn extract_domain(url: &str) -> String {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn extract_domain_strips_scheme_and_path() {
        assert_eq!(
            extract_domain("https://www.centralsuldeleiloes.com.br/api/v2/web/search/lot"),
            "www.centralsuldeleiloes.com.br"
        );
        assert_eq!(extract_domain("example.com"), "example.com");
    }

    #[tokio::test]
    async fn get_returns_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lote/casa-itapiruba"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>lote</html>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(5, "leilao-test/0.1", 0, 0).unwrap();
        let body = fetcher
            .get(&format!("{}/lote/casa-itapiruba", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>lote</html>");
    }

    #[tokio::test]
    async fn post_json_sends_payload() {
        let server = MockServer::start().await;
        let payload = serde_json::json!({"query": "itapiruba"});
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": []}"#))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(5, "leilao-test/0.1", 0, 0).unwrap();
        let body = fetcher
            .post_json(&format!("{}/api/search", server.uri()), &payload)
            .await
            .unwrap();
        assert_eq!(body, r#"{"data": []}"#);
    }

    #[tokio::test]
    async fn maps_429_to_rate_limited_with_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(5, "leilao-test/0.1", 3, 0).unwrap();
        let err = fetcher.get(&server.uri()).await.unwrap_err();
        assert!(
            matches!(err, FetchError::RateLimited { retry_after_secs: 30, .. }),
            "expected RateLimited, got: {err:?}"
        );
        // 429 must not be retried by the fetcher.
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn retries_5xx_then_surfaces_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(5, "leilao-test/0.1", 2, 0).unwrap();
        let err = fetcher.get(&server.uri()).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::UnexpectedStatus { status: 503, .. }
        ));
        // 1 initial + 2 retries
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn does_not_retry_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(5, "leilao-test/0.1", 3, 0).unwrap();
        let err = fetcher.get(&server.uri()).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::UnexpectedStatus { status: 404, .. }
        ));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
