//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::openrouter::OpenRouterClient;
use crate::services::ChatOrchestrator;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    orchestrator: ChatOrchestrator<OpenRouterClient>,
}

impl AppState {
    /// Assemble the shared state from startup resources.
    ///
    /// # Panics
    ///
    /// Panics if the OpenRouter API key contains invalid header characters.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let client = OpenRouterClient::new(config.openrouter());
        let orchestrator = ChatOrchestrator::new(client, config.openrouter());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                orchestrator,
            }),
        }
    }

    /// Startup configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// `PostgreSQL` connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The OpenRouter-backed chat orchestrator.
    #[must_use]
    pub fn orchestrator(&self) -> &ChatOrchestrator<OpenRouterClient> {
        &self.inner.orchestrator
    }
}
