use log::{debug, info, warn};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use reqwest::{Client, StatusCode};
use std::error::Error;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::FetchConfig;
use crate::error::ScrapeError;

/// Minimum body length for a 404 page to be considered a disguised recipe page
const SOFT_BLOCK_MIN_CHARS: usize = 1000;
const SOFT_BLOCK_KEYWORDS: &[&str] = &["recipe", "ingredient"];

/// Heuristic for 404 responses that still carry the recipe.
///
/// Some sites answer automated clients with a 404 status while serving the
/// full page. A long body mentioning recipes or ingredients is treated as
/// such a page. This is a guess and can misjudge both real 404 pages and
/// heavily protected ones.
pub fn looks_like_recipe_page(body: &str) -> bool {
    if body.chars().count() < SOFT_BLOCK_MIN_CHARS {
        return false;
    }
    let lower = body.to_lowercase();
    SOFT_BLOCK_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// A named set of request headers
#[derive(Debug, Clone)]
pub struct FetchStrategy {
    pub name: &'static str,
    headers: HeaderMap,
}

impl FetchStrategy {
    /// Full desktop browser headers
    pub fn browser(user_agent: &str) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(user_agent)?);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        Ok(Self {
            name: "browser",
            headers,
        })
    }

    /// Only a user agent, for sites that reject the fuller header set
    pub fn simple(user_agent: &str) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(user_agent)?);
        Ok(Self {
            name: "simple",
            headers,
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ScrapeError> {
    HeaderValue::from_str(value)
        .map_err(|e| ScrapeError::Configuration(format!("Invalid fetch header value: {}", e)))
}

enum AttemptError {
    /// Worth retrying with the same strategy
    Transient(ScrapeError),
    /// The site refused these headers, another strategy may get through
    Rejected(ScrapeError),
    Final(ScrapeError),
}

impl AttemptError {
    fn into_inner(self) -> ScrapeError {
        match self {
            AttemptError::Transient(e) | AttemptError::Rejected(e) | AttemptError::Final(e) => e,
        }
    }
}

pub struct RequestFetcher {
    client: Client,
    strategies: Vec<FetchStrategy>,
    retries: u32,
    retry_delay_ms: u64,
}

impl RequestFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, ScrapeError> {
        let strategies = vec![
            FetchStrategy::browser(&config.user_agent)?,
            FetchStrategy::simple(&config.user_agent)?,
        ];
        Self::with_strategies(config, strategies)
    }

    pub fn with_strategies(
        config: &FetchConfig,
        strategies: Vec<FetchStrategy>,
    ) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                ScrapeError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            strategies,
            retries: config.retries(),
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    pub fn strategies(&self) -> &[FetchStrategy] {
        &self.strategies
    }

    /// Fetch the raw HTML of `url`, trying each strategy in order.
    ///
    /// Only a 403 or a real 404 moves on to the next strategy. Network
    /// failures, 5xx and 429 end the fetch once the current strategy is done.
    pub async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let mut last_error = None;

        for strategy in &self.strategies {
            match self.fetch_with_retry(strategy, url).await {
                Ok(body) => {
                    info!(
                        "Fetched {} ({} bytes) with '{}' strategy",
                        url,
                        body.len(),
                        strategy.name
                    );
                    return Ok(body);
                }
                Err(AttemptError::Rejected(e)) => {
                    warn!("Strategy '{}' rejected for {}: {}", strategy.name, url, e);
                    last_error = Some(e);
                }
                Err(e) => {
                    let e = e.into_inner();
                    warn!("Fetching {} failed with '{}': {}", url, strategy.name, e);
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ScrapeError::Fetch {
            status: 502,
            message: "Failed to reach recipe site: no fetch strategies configured".to_string(),
        }))
    }

    async fn fetch_with_retry(
        &self,
        strategy: &FetchStrategy,
        url: &str,
    ) -> Result<String, AttemptError> {
        let attempts = self.retries + 1;
        let mut attempt = 1;

        loop {
            debug!(
                "Fetching {} with '{}' (attempt {}/{})",
                url, strategy.name, attempt, attempts
            );

            match self.fetch_once(strategy, url).await {
                Ok(body) => return Ok(body),
                Err(AttemptError::Transient(e)) if attempt < attempts => {
                    let delay = Duration::from_millis(self.retry_delay_ms * attempt as u64);
                    debug!("Transient fetch failure ({}), waiting {:?}", e, delay);
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(
        &self,
        strategy: &FetchStrategy,
        url: &str,
    ) -> Result<String, AttemptError> {
        let response = self
            .client
            .get(url)
            .headers(strategy.headers.clone())
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if status.is_success() {
            let body = response.text().await.map_err(network_error)?;
            if body.trim().is_empty() {
                return Err(AttemptError::Final(ScrapeError::Fetch {
                    status: 502,
                    message: "Failed to reach recipe site: the page was empty".to_string(),
                }));
            }
            return Ok(body);
        }

        match status {
            StatusCode::NOT_FOUND => {
                let body = response.text().await.unwrap_or_default();
                if looks_like_recipe_page(&body) {
                    warn!(
                        "{} answered 404 but the body looks like a recipe page, continuing",
                        url
                    );
                    Ok(body)
                } else {
                    Err(AttemptError::Rejected(ScrapeError::Fetch {
                        status: 502,
                        message: "Failed to reach recipe site: page not found (404)".to_string(),
                    }))
                }
            }
            StatusCode::FORBIDDEN => Err(AttemptError::Rejected(ScrapeError::Fetch {
                status: 403,
                message: "Failed to reach recipe site: access denied (403). \
                          The site may be blocking automated requests."
                    .to_string(),
            })),
            StatusCode::TOO_MANY_REQUESTS => Err(AttemptError::Final(ScrapeError::Fetch {
                status: 429,
                message: "Failed to reach recipe site: rate limited (429). Try again later."
                    .to_string(),
            })),
            status => {
                let error = ScrapeError::Fetch {
                    status: 502,
                    message: format!("Failed to reach recipe site: HTTP {}", status),
                };
                if status.is_server_error() {
                    Err(AttemptError::Transient(error))
                } else {
                    Err(AttemptError::Final(error))
                }
            }
        }
    }
}

fn network_error(e: reqwest::Error) -> AttemptError {
    let cause = error_chain(&e);
    if e.is_timeout() {
        AttemptError::Transient(ScrapeError::Fetch {
            status: 503,
            message: format!("Failed to reach recipe site: request timed out ({})", cause),
        })
    } else if e.is_connect() || e.is_request() {
        AttemptError::Transient(ScrapeError::Fetch {
            status: 502,
            message: format!("Failed to reach recipe site: {}", cause),
        })
    } else {
        AttemptError::Final(ScrapeError::Fetch {
            status: 502,
            message: format!("Failed to reach recipe site: {}", cause),
        })
    }
}

fn error_chain(e: &dyn Error) -> String {
    let mut parts = vec![e.to_string()];
    let mut source = e.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    fn test_config() -> FetchConfig {
        FetchConfig {
            retry_delay_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_recipe_page_predicate() {
        let long_recipe = format!("<html>{}Ingredients: flour</html>", " ".repeat(1200));
        assert!(looks_like_recipe_page(&long_recipe));

        let long_other = format!("<html>{}Page not found</html>", " ".repeat(1200));
        assert!(!looks_like_recipe_page(&long_other));

        assert!(!looks_like_recipe_page("<html>recipe</html>"));
    }

    #[test]
    fn test_default_strategies_in_order() {
        let fetcher = RequestFetcher::new(&test_config()).unwrap();
        let names: Vec<_> = fetcher.strategies().iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["browser", "simple"]);
    }

    #[test]
    fn test_invalid_user_agent_is_configuration_error() {
        let config = FetchConfig {
            user_agent: "bad\nagent".to_string(),
            ..test_config()
        };
        let err = RequestFetcher::new(&config).err().unwrap();
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/pie")
            .with_status(200)
            .with_body("<html><body>Pie</body></html>")
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(&test_config()).unwrap();
        let body = fetcher.fetch(&format!("{}/pie", server.url())).await.unwrap();
        assert!(body.contains("Pie"));
    }

    #[tokio::test]
    async fn test_forbidden_then_simple_strategy_succeeds() {
        let mut server = mockito::Server::new_async().await;
        let blocked = server
            .mock("GET", "/pie")
            .match_header("upgrade-insecure-requests", "1")
            .with_status(403)
            .create_async()
            .await;
        let allowed = server
            .mock("GET", "/pie")
            .match_header("upgrade-insecure-requests", mockito::Matcher::Missing)
            .with_status(200)
            .with_body("<p>Pie</p>")
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(&test_config()).unwrap();
        let body = fetcher.fetch(&format!("{}/pie", server.url())).await.unwrap();
        assert_eq!(body, "<p>Pie</p>");
        blocked.assert_async().await;
        allowed.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_stops_strategies() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("GET", "/pie")
            .with_status(429)
            .expect(1)
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(&test_config()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/pie", server.url()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 429);
        assert!(err.to_string().contains("rate limited"));
        limited.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let mut server = mockito::Server::new_async().await;
        // one retry, then no other strategy is tried
        let failing = server
            .mock("GET", "/pie")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(&test_config()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/pie", server.url()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 502);
        assert!(err.to_string().contains("503"));
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_soft_404_continues() {
        let mut server = mockito::Server::new_async().await;
        let body = format!(
            "<html><body><h1>Grandma's Recipe</h1><p>{}</p></body></html>",
            "Ingredients and steps. ".repeat(60)
        );
        let _m = server
            .mock("GET", "/pie")
            .with_status(404)
            .with_body(&body)
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(&test_config()).unwrap();
        let fetched = fetcher.fetch(&format!("{}/pie", server.url())).await.unwrap();
        assert_eq!(fetched, body);
    }

    #[tokio::test]
    async fn test_real_404_fails() {
        let mut server = mockito::Server::new_async().await;
        let missing = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("Not Found")
            .expect(2)
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(&test_config()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Fetch { status: 502, .. }));
        assert!(err.to_string().contains("404"));
        missing.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_body_fails() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/blank")
            .with_status(200)
            .with_body("   \n ")
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(&test_config()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/blank", server.url()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    /// Accepts connections and closes them at once, counting each one
    async fn closing_listener() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connections);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                drop(socket);
            }
        });
        (format!("http://{}/pie", addr), connections)
    }

    #[tokio::test]
    async fn test_dropped_connections_do_not_try_other_strategies() {
        let (url, connections) = closing_listener().await;
        let config = FetchConfig {
            retry_attempts: 2,
            ..test_config()
        };

        let fetcher = RequestFetcher::new(&config).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert!(matches!(err, ScrapeError::Fetch { status: 502, .. }));
        assert!(err.to_string().starts_with("Failed to reach recipe site"));
        assert_eq!(connections.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_is_transient_503() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let err = client
            .get(format!("http://{}/pie", addr))
            .send()
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        match network_error(err) {
            AttemptError::Transient(ScrapeError::Fetch { status, message }) => {
                assert_eq!(status, 503);
                assert!(message.contains("timed out"));
            }
            other => panic!("unexpected classification: {}", other.into_inner()),
        }
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let fetcher = RequestFetcher::new(&test_config()).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:1/pie").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Fetch { status: 502, .. }));
        assert!(err.to_string().starts_with("Failed to reach recipe site"));
    }
}
