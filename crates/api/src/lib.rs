pub mod routes;
pub mod state;

use axum::Router;
use cotacao_core::{QuoteRepository, QuoteSource, ServerSettings};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use routes::ApiError;
pub use state::AppState;

/// Where the server listens and which path serves the quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub route: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_settings(&ServerSettings::default())
    }
}

impl ServerConfig {
    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            route: settings.route.clone(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The quote HTTP server: one route, no global registration.
pub struct QuoteServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl QuoteServer {
    pub fn new(
        config: ServerConfig,
        source: Arc<dyn QuoteSource>,
        repository: Arc<dyn QuoteRepository>,
    ) -> Self {
        Self {
            config,
            state: Arc::new(AppState::new(source, repository)),
        }
    }

    /// Build the Axum application router.
    pub fn router(&self) -> Router {
        routes::quote_routes(&self.config.route)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        tracing::info!(
            addr = %listener.local_addr()?,
            route = %self.config.route,
            "Quote server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("Quote server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
