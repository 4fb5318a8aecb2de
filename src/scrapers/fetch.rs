//! Page fetching.
//!
//! Fetch failures never escape this module: a page that cannot be
//! downloaded is logged here and reported to the caller as `None`.

use crate::config::{FETCH_TIMEOUT, USER_AGENT};
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Something that can hand back the raw markup of a page.
pub trait PageSource {
    /// Download `url`. `None` on timeout, non-2xx status or an unreadable body.
    async fn fetch_page(&self, url: &str) -> Option<String>;
}

/// [`PageSource`] backed by `reqwest`, with a browser User-Agent and a fixed timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl PageSource for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_page(&self, url: &str) -> Option<String> {
        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(%url, error = %e, "Request failed");
                return None;
            }
        };
        let resp = match resp.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!(%url, status = ?e.status(), "Unexpected HTTP status");
                return None;
            }
        };
        match resp.text().await {
            Ok(body) => {
                debug!(%url, bytes = body.len(), "Fetched page");
                Some(body)
            }
            Err(e) => {
                warn!(%url, error = %e, "Failed to read response body");
                None
            }
        }
    }
}

/// Fetch `url` and parse it into a queryable document.
pub async fn fetch_document<P: PageSource>(source: &P, url: &str) -> Option<Html> {
    let body = source.fetch_page(url).await?;
    Some(Html::parse_document(&body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/answers/"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>hi</h1>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let body = fetcher.fetch_page(&format!("{}/answers/", server.uri())).await;
        assert_eq!(body.as_deref(), Some("<h1>hi</h1>"));
    }

    #[tokio::test]
    async fn test_non_2xx_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        assert!(fetcher.fetch_page(&format!("{}/gone", server.uri())).await.is_none());
    }

    #[tokio::test]
    async fn test_timeout_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::with_timeout(Duration::from_millis(50)).unwrap();
        assert!(fetcher.fetch_page(&server.uri()).await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_none() {
        let fetcher = HttpFetcher::with_timeout(Duration::from_millis(200)).unwrap();
        assert!(fetcher.fetch_page("http://127.0.0.1:9/").await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_document_parses_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p class=\"x\">text</p>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let doc = fetch_document(&fetcher, &server.uri()).await.unwrap();
        let sel = Selector::parse("p.x").unwrap();
        assert_eq!(doc.select(&sel).count(), 1);
    }
}
