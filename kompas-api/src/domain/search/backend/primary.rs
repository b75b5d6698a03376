//! Primary search backend: ranks denormalized index documents straight
//! from the relational store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::search::explain::explain_companies;
use crate::domain::search::ranking;
use crate::domain::search::traits::{Result, SearchBackend, SearchStore};
use crate::domain::search::types::{ParsedQuery, SearchExplain, SearchHit};

pub struct PrimaryBackend<S> {
    store: Arc<S>,
}

impl<S> PrimaryBackend<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: SearchStore> SearchBackend for PrimaryBackend<S> {
    async fn search(&self, scope: Option<&[i32]>, query: &ParsedQuery) -> Result<Vec<SearchHit>> {
        let candidates = self.store.candidates(scope, query).await?;
        Ok(ranking::rank(
            &candidates.indexed,
            &candidates.unindexed,
            query,
        ))
    }

    async fn explain(
        &self,
        ids: &[i32],
        query: &ParsedQuery,
        max_reasons: usize,
    ) -> Result<HashMap<i32, SearchExplain>> {
        explain_companies(self.store.as_ref(), ids, query, max_reasons).await
    }
}
