//! Composition root: wires the store, the configured search backend and
//! the indexer into the shared application state.

use std::sync::Arc;
use std::time::Duration;

use searchbox::SearchboxClient;
use sqlx::PgPool;
use tracing::warn;

use crate::config::SearchSettings;
use crate::domain::search::{
    FallbackBackend, IndexerConfig, PrimaryBackend, RemoteBackend, RemoteIndex, SearchBackend,
    SearchBackendKind, SearchIndexer, SearchService,
};
use crate::domain::search::repository::PgSearchStore;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: Arc<PgPool>,
    pub search: SearchService,
    pub indexer: Arc<SearchIndexer<PgSearchStore>>,
}

impl AppState {
    pub fn new(db_pool: PgPool, settings: &SearchSettings) -> Self {
        let store = Arc::new(PgSearchStore::new(db_pool.clone()));
        let (backend, remote_index) = build_backend(settings, store.clone());

        let indexer = SearchIndexer::new(
            store,
            remote_index,
            IndexerConfig {
                batch_size: settings.index_batch_size,
            },
        );

        Self {
            db_pool: Arc::new(db_pool),
            search: SearchService::new(backend),
            indexer: Arc::new(indexer),
        }
    }
}

/// Resolve the configured backend. Unknown kinds and a searchbox client
/// that cannot even be constructed both resolve to the primary backend;
/// backend selection never fails the application.
fn build_backend(
    settings: &SearchSettings,
    store: Arc<PgSearchStore>,
) -> (Arc<dyn SearchBackend>, Option<RemoteIndex>) {
    match SearchBackendKind::parse(&settings.backend) {
        SearchBackendKind::Primary => (Arc::new(PrimaryBackend::new(store)), None),
        SearchBackendKind::Searchbox => {
            let client = SearchboxClient::new(
                &settings.searchbox.url,
                settings.searchbox.api_key.clone(),
                Duration::from_secs(settings.searchbox.timeout_secs),
            );
            match client {
                Ok(client) => {
                    let index = RemoteIndex::new(client, settings.searchbox.index_uid.clone());
                    let remote = RemoteBackend::new(index.clone(), store.clone());
                    let backend: Arc<dyn SearchBackend> = if settings.fallback_to_primary {
                        Arc::new(FallbackBackend::new(remote, PrimaryBackend::new(store)))
                    } else {
                        Arc::new(remote)
                    };
                    (backend, Some(index))
                }
                Err(e) => {
                    warn!(error = %e, "Failed to create searchbox client, using primary backend");
                    (Arc::new(PrimaryBackend::new(store)), None)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

    use super::*;
    use crate::config::SearchboxSettings;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new().connect_lazy_with(PgConnectOptions::new())
    }

    fn settings(backend: &str) -> SearchSettings {
        SearchSettings {
            backend: backend.to_string(),
            fallback_to_primary: true,
            index_worker_interval_secs: 0,
            index_batch_size: 100,
            searchbox: SearchboxSettings {
                url: "http://localhost:7700".to_string(),
                api_key: None,
                timeout_secs: 2,
                index_uid: "companies".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn state_builds_for_every_backend_kind() {
        for backend in ["primary", "searchbox", "something-else", ""] {
            let _state = AppState::new(lazy_pool(), &settings(backend));
        }
    }
}
