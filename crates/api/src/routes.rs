use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use cotacao_core::{FetchError, StoreError};
use std::sync::Arc;
use tracing::{error, info};

/// Failures of the quote endpoint. All of them surface as a bare 500.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Failed to fetch quote: {0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to store quote: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self, "Quote request failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

pub fn quote_routes(route: &str) -> Router<Arc<AppState>> {
    Router::new().route(route, get(current_bid))
}

/// Fetch a fresh quote, persist it, and answer with its bid as a JSON string.
async fn current_bid(State(state): State<Arc<AppState>>) -> Result<Json<String>, ApiError> {
    let quote = state.source.fetch().await?;
    let id = state.repository.save(&quote).await?;
    info!(id, bid = %quote.bid, "Served quote");
    Ok(Json(quote.bid))
}
