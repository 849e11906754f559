use std::sync::Arc;

use serde_json::Value;

use sampler_infra::{
    InMemoryKeyValueStore, InMemoryStore, KeyValueStore, PgSessionProvider, SessionProvider,
    StoreError,
};

use crate::config::AppConfig;

/// Shared, request-independent collaborators handed to every route group.
#[derive(Clone)]
pub struct AppServices {
    pub sessions: Arc<dyn SessionProvider>,
    /// Demo map written by the `convert_to_jsonable` endpoint.
    pub demo: Arc<dyn KeyValueStore<Value>>,
}

impl AppServices {
    pub fn new(sessions: Arc<dyn SessionProvider>) -> Self {
        Self {
            sessions,
            demo: Arc::new(InMemoryKeyValueStore::new()),
        }
    }

    /// In-memory wiring (dev/test). The caller keeps its clone of `store` to
    /// seed data or inspect session counters.
    pub fn in_memory(store: InMemoryStore) -> Self {
        Self::new(Arc::new(store))
    }
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("demo_entries", &self.demo.len())
            .finish_non_exhaustive()
    }
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    match &config.database_url {
        Some(url) => {
            let provider = PgSessionProvider::connect(url, config.database_max_connections).await?;
            provider.ensure_schema().await?;
            tracing::info!(max_connections = config.database_max_connections, "using postgres store");
            Ok(AppServices::new(Arc::new(provider)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store");
            Ok(AppServices::in_memory(InMemoryStore::new()))
        }
    }
}
