//! Background worker for periodic full index rebuilds.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use super::indexer::SearchIndexer;
use super::traits::SearchStore;

/// Runs a periodic full rebuild of the company search index.
///
/// Errors for individual cycles are logged and skipped; the loop never
/// exits on its own.
pub async fn run_index_worker<S: SearchStore>(indexer: Arc<SearchIndexer<S>>, interval: Duration) {
    info!(
        interval_secs = interval.as_secs(),
        "Search index worker started"
    );

    let mut ticker = tokio::time::interval(interval);

    // Skip the first immediate tick to let the app fully start.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        info!("Starting search index rebuild cycle");
        match indexer.rebuild_all().await {
            Ok(stats) => {
                info!(
                    rebuilt = stats.rebuilt,
                    deleted = stats.deleted,
                    errors = stats.errors,
                    "Search index rebuild cycle completed"
                );
            }
            Err(e) => {
                error!(error = %e, "Search index rebuild cycle failed");
            }
        }
    }
}
