pub mod db;
pub mod fetcher;

pub use db::{SqliteQuoteStore, StoreSession};
pub use fetcher::AwesomeApiFetcher;
