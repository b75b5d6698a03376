//! Index maintenance: single-company rebuild plus the batch entry point
//! used by maintenance tooling and the background worker.

use std::sync::Arc;

use tracing::{info, warn};

use super::backend::RemoteIndex;
use super::traits::{Result, SearchStore};
use super::types::RebuildStats;

/// Configuration for batch rebuilds.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Companies processed per page during a batch rebuild.
    pub batch_size: i64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self { batch_size: 500 }
    }
}

/// Rebuilds search index rows and keeps the remote index (when one is
/// configured) in step with them.
pub struct SearchIndexer<S> {
    store: Arc<S>,
    remote: Option<RemoteIndex>,
    config: IndexerConfig,
}

impl<S: SearchStore> SearchIndexer<S> {
    pub fn new(store: Arc<S>, remote: Option<RemoteIndex>, config: IndexerConfig) -> Self {
        Self {
            store,
            remote,
            config,
        }
    }

    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, None, IndexerConfig::default())
    }

    /// Rebuild one company's index row. When the company is gone, its
    /// index row (local and remote) is removed instead.
    pub async fn rebuild_company(&self, company_id: i32) -> Result<()> {
        match self.store.rebuild_company(company_id).await? {
            Some(doc) => {
                if let Some(remote) = &self.remote {
                    // Remote failures are logged inside; the local rebuild
                    // already succeeded and must not be rolled back.
                    remote.index_one(&doc).await;
                }
            }
            None => {
                self.store.delete_document(company_id).await?;
                if let Some(remote) = &self.remote {
                    remote.delete_one(company_id).await;
                }
            }
        }
        Ok(())
    }

    /// Rebuild every company, paging through ids in batches. Individual
    /// failures are counted and skipped, not fatal.
    pub async fn rebuild_all(&self) -> Result<RebuildStats> {
        let mut stats = RebuildStats::default();
        let mut after_id = 0;

        loop {
            let ids = self
                .store
                .company_ids_page(after_id, self.config.batch_size)
                .await?;
            let Some(last) = ids.last().copied() else {
                break;
            };

            for id in ids {
                match self.store.rebuild_company(id).await {
                    Ok(Some(doc)) => {
                        stats.rebuilt += 1;
                        if let Some(remote) = &self.remote {
                            remote.index_one(&doc).await;
                        }
                    }
                    Ok(None) => {
                        self.store.delete_document(id).await?;
                        stats.deleted += 1;
                    }
                    Err(e) => {
                        warn!(company_id = id, error = %e, "Failed to rebuild search index row");
                        stats.errors += 1;
                    }
                }
            }
            after_id = last;
        }

        info!(
            rebuilt = stats.rebuilt,
            deleted = stats.deleted,
            errors = stats.errors,
            "Batch index rebuild completed"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::domain::company::{Company, CompanyRelated};
    use crate::domain::search::repository::MockSearchStore;

    fn make_company(id: i32, name: &str) -> Company {
        Company {
            id,
            name: name.to_string(),
            legal_name: None,
            tax_id: None,
            external_id: None,
            address: None,
            website: None,
            schedule: None,
            primary_phone: None,
            primary_email: None,
            secondary_email: None,
            raw_import: None,
            created_at: datetime!(2024-01-10 12:00 UTC),
            updated_at: datetime!(2024-06-01 9:30 UTC),
        }
    }

    #[tokio::test]
    async fn rebuild_all_pages_through_every_company() {
        let mut store = MockSearchStore::new();
        for id in 1..=7 {
            store = store
                .with_unindexed_company(make_company(id, &format!("Компания {id}")), CompanyRelated::default());
        }
        let store = Arc::new(store);
        let indexer = SearchIndexer::new(
            store.clone(),
            None,
            IndexerConfig { batch_size: 3 },
        );

        let stats = indexer.rebuild_all().await.unwrap();
        assert_eq!(stats.rebuilt, 7);
        assert_eq!(stats.errors, 0);
        assert_eq!(store.document_count(), 7);
    }

    #[tokio::test]
    async fn rebuild_of_deleted_company_drops_its_document() {
        let store = Arc::new(
            MockSearchStore::new()
                .with_indexed_company(make_company(1, "Ромашка"), CompanyRelated::default()),
        );
        assert_eq!(store.document_count(), 1);

        store.remove_company(1);
        let indexer = SearchIndexer::with_defaults(store.clone());
        indexer.rebuild_company(1).await.unwrap();

        assert_eq!(store.document_count(), 0);
    }
}
