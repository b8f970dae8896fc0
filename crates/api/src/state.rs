use cotacao_core::{QuoteRepository, QuoteSource};
use std::sync::Arc;

/// Collaborators shared by the route handlers. Read-only across requests.
pub struct AppState {
    pub source: Arc<dyn QuoteSource>,
    pub repository: Arc<dyn QuoteRepository>,
}

impl AppState {
    pub fn new(source: Arc<dyn QuoteSource>, repository: Arc<dyn QuoteRepository>) -> Self {
        Self { source, repository }
    }
}
