use crate::models::*;
use async_trait::async_trait;
use std::fmt;

// ---------------------------------------------------------------------------
// Quote Source Trait
// ---------------------------------------------------------------------------

/// Errors that can occur while fetching a quote from the upstream API.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Upstream call exceeded its deadline")]
    DeadlineExceeded,
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Upstream responded with status {0}")]
    Status(u16),
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Produces the current quote for a currency pair.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch one fresh quote. Never retried by callers.
    async fn fetch(&self) -> Result<Quote, FetchError>;
}

// ---------------------------------------------------------------------------
// Quote Repository Trait
// ---------------------------------------------------------------------------

/// The step of a store session that was running when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStage {
    Connect,
    Schema,
    Insert,
}

impl fmt::Display for StoreStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            StoreStage::Connect => "connect",
            StoreStage::Schema => "schema",
            StoreStage::Insert => "insert",
        };
        f.write_str(stage)
    }
}

/// Errors that can occur while persisting a quote.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database deadline exceeded during {stage}")]
    DeadlineExceeded { stage: StoreStage },
    #[error("Database error during {stage}: {message}")]
    Database { stage: StoreStage, message: String },
}

impl StoreError {
    pub fn stage(&self) -> StoreStage {
        match self {
            StoreError::DeadlineExceeded { stage } | StoreError::Database { stage, .. } => *stage,
        }
    }
}

/// Append-only persistence for fetched quotes.
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    /// Ensure the schema exists and insert one row for `quote`.
    /// Returns the id of the new row.
    async fn save(&self, quote: &Quote) -> Result<i64, StoreError>;
}
