//! Fallback wrapper: tries the remote backend, silently falls back to the
//! primary one when the remote side is unavailable or answers garbage.
//!
//! The wrapper implements [`SearchBackend`] itself, so callers cannot
//! tell which engine served them; the switch is logged for operators
//! only.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::search::traits::{Result, SearchBackend};
use crate::domain::search::types::{ParsedQuery, SearchExplain, SearchHit};

pub struct FallbackBackend<R, P> {
    remote: R,
    primary: P,
}

impl<R, P> FallbackBackend<R, P> {
    pub fn new(remote: R, primary: P) -> Self {
        Self { remote, primary }
    }
}

#[async_trait]
impl<R: SearchBackend, P: SearchBackend> SearchBackend for FallbackBackend<R, P> {
    async fn search(&self, scope: Option<&[i32]>, query: &ParsedQuery) -> Result<Vec<SearchHit>> {
        match self.remote.search(scope, query).await {
            Ok(hits) => Ok(hits),
            Err(e) => {
                warn!(error = %e, "Remote search failed, falling back to primary backend");
                self.primary.search(scope, query).await
            }
        }
    }

    async fn explain(
        &self,
        ids: &[i32],
        query: &ParsedQuery,
        max_reasons: usize,
    ) -> Result<HashMap<i32, SearchExplain>> {
        match self.remote.explain(ids, query, max_reasons).await {
            Ok(explains) => Ok(explains),
            Err(e) => {
                warn!(error = %e, "Remote explain failed, falling back to primary backend");
                self.primary.explain(ids, query, max_reasons).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::domain::search::parser::{parse_query, MAX_TOKENS};
    use crate::domain::search::traits::SearchError;

    struct StubBackend {
        hits: std::result::Result<Vec<i32>, ()>,
    }

    #[async_trait]
    impl SearchBackend for StubBackend {
        async fn search(
            &self,
            _scope: Option<&[i32]>,
            _query: &ParsedQuery,
        ) -> Result<Vec<SearchHit>> {
            match &self.hits {
                Ok(ids) => Ok(ids
                    .iter()
                    .map(|id| SearchHit {
                        company_id: *id,
                        score: 1.0,
                        updated_at: datetime!(2024-01-01 0:00 UTC),
                    })
                    .collect()),
                Err(()) => Err(SearchError::BackendUnavailable("down".to_string())),
            }
        }

        async fn explain(
            &self,
            ids: &[i32],
            _query: &ParsedQuery,
            _max_reasons: usize,
        ) -> Result<HashMap<i32, SearchExplain>> {
            match &self.hits {
                Ok(_) => Ok(ids
                    .iter()
                    .map(|id| {
                        (
                            *id,
                            SearchExplain {
                                company_id: *id,
                                reasons: vec![],
                                total_reasons: 0,
                                name_html: String::new(),
                                tax_id_html: String::new(),
                                address_html: String::new(),
                            },
                        )
                    })
                    .collect()),
                Err(()) => Err(SearchError::BackendUnavailable("down".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn healthy_remote_serves_the_request() {
        let backend = FallbackBackend::new(
            StubBackend { hits: Ok(vec![1]) },
            StubBackend { hits: Ok(vec![2]) },
        );

        let query = parse_query("ромашка", MAX_TOKENS);
        let hits = backend.search(None, &query).await.unwrap();
        assert_eq!(hits[0].company_id, 1);
    }

    #[tokio::test]
    async fn failed_remote_falls_back_to_primary() {
        let backend = FallbackBackend::new(
            StubBackend { hits: Err(()) },
            StubBackend { hits: Ok(vec![2]) },
        );

        let query = parse_query("ромашка", MAX_TOKENS);
        let hits = backend.search(None, &query).await.unwrap();
        assert_eq!(hits[0].company_id, 2);

        let explains = backend.explain(&[2], &query, 10).await.unwrap();
        assert!(explains.contains_key(&2));
    }

    #[tokio::test]
    async fn both_backends_failing_surfaces_the_error() {
        let backend = FallbackBackend::new(
            StubBackend { hits: Err(()) },
            StubBackend { hits: Err(()) },
        );

        let query = parse_query("ромашка", MAX_TOKENS);
        assert!(backend.search(None, &query).await.is_err());
    }
}
