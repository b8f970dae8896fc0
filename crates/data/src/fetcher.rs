use async_trait::async_trait;
use cotacao_core::{CurrencyPair, FetchError, Quote, QuoteSource, Settings};
use std::time::Duration;
use tracing::{debug, warn};

/// Fetches the latest quote for one pair from the AwesomeAPI economy service
/// (`GET {base_url}/json/last/{BASE-QUOTE}`).
pub struct AwesomeApiFetcher {
    http: reqwest::Client,
    url: String,
    pair: CurrencyPair,
    /// Overall budget: connect, request, status and full body read.
    timeout: Duration,
}

impl AwesomeApiFetcher {
    pub fn new(base_url: &str, pair: CurrencyPair, timeout: Duration) -> Self {
        let url = format!(
            "{}/json/last/{}",
            base_url.trim_end_matches('/'),
            pair.path_segment()
        );
        Self {
            http: reqwest::Client::new(),
            url,
            pair,
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.upstream.base_url,
            settings.upstream.pair.clone(),
            settings.timeouts().upstream,
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self) -> Result<Quote, FetchError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(Box::new(e)))?;

        Quote::from_upstream(&body, &self.pair)
    }
}

#[async_trait]
impl QuoteSource for AwesomeApiFetcher {
    async fn fetch(&self) -> Result<Quote, FetchError> {
        match tokio::time::timeout(self.timeout, self.request()).await {
            Ok(Ok(quote)) => {
                debug!(pair = %self.pair, bid = %quote.bid, "Fetched upstream quote");
                Ok(quote)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!(
                    url = %self.url,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Insufficient time for the upstream quote call"
                );
                Err(FetchError::DeadlineExceeded)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};

    const PAYLOAD: &str = r#"{"USDBRL":{"code":"USD","codein":"BRL","name":"Dólar Americano/Real Brasileiro","high":"5.4470","low":"5.3965","varBid":"0.0125","pctChange":"0.23","bid":"5.4321","ask":"5.4331","timestamp":"1718915996"}}"#;

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_url_from_pair() {
        let fetcher = AwesomeApiFetcher::new(
            "https://economia.awesomeapi.com.br/",
            CurrencyPair::usd_brl(),
            Duration::from_millis(200),
        );
        assert_eq!(
            fetcher.url(),
            "https://economia.awesomeapi.com.br/json/last/USD-BRL"
        );
    }

    #[test]
    fn test_from_settings_uses_configured_timeout() {
        let mut settings = Settings::default();
        settings.upstream.pair = CurrencyPair::new("EUR", "BRL");
        settings.upstream.timeout_ms = 750;

        let fetcher = AwesomeApiFetcher::from_settings(&settings);
        assert_eq!(fetcher.timeout, Duration::from_millis(750));
        assert_eq!(
            fetcher.url(),
            "https://economia.awesomeapi.com.br/json/last/EUR-BRL"
        );
    }

    #[tokio::test]
    async fn test_fetch_decodes_quote() {
        let router = Router::new().route("/json/last/USD-BRL", get(|| async { PAYLOAD }));
        let base = spawn_upstream(router).await;

        let fetcher =
            AwesomeApiFetcher::new(&base, CurrencyPair::usd_brl(), Duration::from_secs(2));
        let quote = fetcher.fetch().await.unwrap();

        assert_eq!(quote.code, "USD");
        assert_eq!(quote.codein, "BRL");
        assert_eq!(quote.var_bid, "0.0125");
        assert_eq!(quote.pct_change, "0.23");
        assert_eq!(quote.bid, "5.4321");
        assert_eq!(quote.ask, "5.4331");
    }

    #[tokio::test]
    async fn test_fetch_deadline_exceeded() {
        let router = Router::new().route(
            "/json/last/USD-BRL",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                PAYLOAD
            }),
        );
        let base = spawn_upstream(router).await;

        let fetcher =
            AwesomeApiFetcher::new(&base, CurrencyPair::usd_brl(), Duration::from_millis(50));
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = AwesomeApiFetcher::new(
            &format!("http://{}", addr),
            CurrencyPair::usd_brl(),
            Duration::from_secs(2),
        );
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_fetch_upstream_error_status() {
        let router = Router::new().route(
            "/json/last/USD-BRL",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "try again later") }),
        );
        let base = spawn_upstream(router).await;

        let fetcher =
            AwesomeApiFetcher::new(&base, CurrencyPair::usd_brl(), Duration::from_secs(2));
        match fetcher.fetch().await {
            Err(FetchError::Status(code)) => assert_eq!(code, 503),
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let router = Router::new().route("/json/last/USD-BRL", get(|| async { "{\"USDBRL\":" }));
        let base = spawn_upstream(router).await;

        let fetcher =
            AwesomeApiFetcher::new(&base, CurrencyPair::usd_brl(), Duration::from_secs(2));
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
