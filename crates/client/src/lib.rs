//! Quote client: asks the quote server for the current bid and writes it to
//! a local file.

use cotacao_core::Settings;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Errors that abort a client run. None of them leaves a file behind.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Call to the quote server exceeded its deadline")]
    DeadlineExceeded,
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Quote server responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("Quote server body is not a JSON string: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// HTTP client for the quote server's endpoint.
pub struct QuoteClient {
    http: reqwest::Client,
    url: String,
    /// Overall budget for the request and the body read.
    timeout: Duration,
}

impl QuoteClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.client.server_url.clone(),
            settings.timeouts().client,
        )
    }

    /// Fetch the current bid. Anything other than a 200 carrying a JSON
    /// string is an error.
    pub async fn fetch_bid(&self) -> Result<String, ClientError> {
        match tokio::time::timeout(self.timeout, self.request()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    url = %self.url,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Insufficient time for the call to the server"
                );
                Err(ClientError::DeadlineExceeded)
            }
        }
    }

    async fn request(&self) -> Result<String, ClientError> {
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ClientError::Status(status));
        }
        let body = response.bytes().await?;
        let bid: String = serde_json::from_slice(&body)?;
        debug!(bid = %bid, "Received bid");
        Ok(bid)
    }
}

/// The line written to the output file, e.g. `Dólar: 5.4321`.
pub fn format_line(label: &str, bid: &str) -> String {
    format!("{}: {}", label, bid)
}

/// Overwrite `path` with the formatted quote line.
pub async fn save_quote(path: &Path, label: &str, bid: &str) -> Result<(), ClientError> {
    let content = format!("{}\n", format_line(label, bid));
    tokio::fs::write(path, content)
        .await
        .map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// One client run: fetch the bid, then save it. Returns the bid.
pub async fn run(settings: &Settings) -> Result<String, ClientError> {
    let client = QuoteClient::from_settings(settings);
    let bid = client.fetch_bid().await?;
    let output = &settings.client.output;
    save_quote(output, &settings.client.label, &bid).await?;
    info!(bid = %bid, output = %output.display(), "Saved quote");
    Ok(bid)
}
