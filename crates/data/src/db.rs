use async_trait::async_trait;
use cotacao_core::{Quote, QuoteRepository, Settings, StoreError, StoreStage};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteQueryResult};
use sqlx::{ConnectOptions, Connection};
use std::path::Path;
use std::time::Duration;
use tokio::time::{error::Elapsed, timeout_at, Instant};
use tracing::{debug, warn};

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS cotacoes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT,
        codein TEXT,
        name TEXT,
        high TEXT,
        low TEXT,
        varBid TEXT,
        pctChange TEXT,
        bid TEXT,
        ask TEXT,
        created_at DATETIME DEFAULT (DATETIME(CURRENT_TIMESTAMP, 'localtime'))
    )";

const INSERT_QUOTE: &str = "
    INSERT INTO cotacoes (code, codein, name, high, low, varBid, pctChange, bid, ask)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// SQLite-backed quote store.
///
/// Holds no connection: every save opens the database file, runs the DDL and
/// the insert under a single deadline, and closes it again.
#[derive(Debug, Clone)]
pub struct SqliteQuoteStore {
    options: SqliteConnectOptions,
    timeout: Duration,
}

impl SqliteQuoteStore {
    pub fn new(path: impl AsRef<Path>, timeout: Duration) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(timeout);
        Self { options, timeout }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.database.path, settings.timeouts().database)
    }

    /// Open the database file and start the deadline for this session.
    pub async fn open_session(&self) -> Result<StoreSession, StoreError> {
        let deadline = Instant::now() + self.timeout;
        let conn = settle(
            StoreStage::Connect,
            timeout_at(deadline, self.options.connect()).await,
        )?;
        Ok(StoreSession { conn, deadline })
    }
}

/// One open connection plus the deadline every statement on it shares.
#[derive(Debug)]
pub struct StoreSession {
    conn: SqliteConnection,
    deadline: Instant,
}

impl StoreSession {
    /// Create the `cotacoes` table if it does not exist yet.
    pub async fn ensure_schema(&mut self) -> Result<(), StoreError> {
        let result = timeout_at(
            self.deadline,
            sqlx::query(CREATE_TABLE).execute(&mut self.conn),
        )
        .await;
        settle(StoreStage::Schema, result).map(|_| ())
    }

    /// Insert one row for `quote`, returning its id.
    pub async fn insert(&mut self, quote: &Quote) -> Result<i64, StoreError> {
        let query = sqlx::query(INSERT_QUOTE)
            .bind(&quote.code)
            .bind(&quote.codein)
            .bind(&quote.name)
            .bind(&quote.high)
            .bind(&quote.low)
            .bind(&quote.var_bid)
            .bind(&quote.pct_change)
            .bind(&quote.bid)
            .bind(&quote.ask);
        let result = timeout_at(self.deadline, query.execute(&mut self.conn)).await;
        let done: SqliteQueryResult = settle(StoreStage::Insert, result)?;
        Ok(done.last_insert_rowid())
    }

    /// Close the connection. Not bounded by the session deadline.
    pub async fn close(self) -> Result<(), sqlx::Error> {
        self.conn.close().await
    }
}

fn settle<T>(
    stage: StoreStage,
    result: Result<Result<T, sqlx::Error>, Elapsed>,
) -> Result<T, StoreError> {
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(StoreError::Database {
            stage,
            message: e.to_string(),
        }),
        Err(_) => {
            match stage {
                StoreStage::Connect => warn!("Insufficient time to open the database"),
                StoreStage::Schema => warn!("Insufficient time to create the table"),
                StoreStage::Insert => warn!("Insufficient time to insert the record"),
            }
            Err(StoreError::DeadlineExceeded { stage })
        }
    }
}

#[async_trait]
impl QuoteRepository for SqliteQuoteStore {
    async fn save(&self, quote: &Quote) -> Result<i64, StoreError> {
        let mut session = self.open_session().await?;
        session.ensure_schema().await?;
        let id = session.insert(quote).await?;
        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close database connection");
        }
        debug!(id, bid = %quote.bid, "Stored quote");
        Ok(id)
    }
}
