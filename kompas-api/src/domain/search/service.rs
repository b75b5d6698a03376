//! Search facade injected wherever search is needed.
//!
//! The backend is chosen once at startup from configuration and passed in
//! explicitly; nothing in here consults global state.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use strum::{Display, EnumString};

use super::explain::MAX_REASONS;
use super::parser::{parse_query, MAX_TOKENS};
use super::traits::{Result, SearchBackend};
use super::types::{SearchExplain, SearchHit};

/// Which backend serves searches. Unrecognized configuration values
/// deterministically resolve to the primary backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum SearchBackendKind {
    #[default]
    #[strum(ascii_case_insensitive, serialize = "primary")]
    Primary,
    #[strum(ascii_case_insensitive, serialize = "searchbox")]
    Searchbox,
}

impl SearchBackendKind {
    /// Parse a configuration value, falling back to primary: selecting a
    /// backend must never fail or silently return nothing.
    pub fn parse(value: &str) -> Self {
        Self::from_str(value.trim()).unwrap_or_default()
    }
}

/// The public search contract consumed by the presentation layer.
#[derive(Clone)]
pub struct SearchService {
    backend: Arc<dyn SearchBackend>,
}

impl SearchService {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Filter and order a base set of company ids by a raw query.
    ///
    /// An empty query leaves the input unchanged; a query that reduces to
    /// zero tokens matches nothing.
    pub async fn apply(&self, base: Vec<i32>, raw_query: &str) -> Result<Vec<i32>> {
        let raw_query = raw_query.trim();
        if raw_query.is_empty() {
            return Ok(base);
        }

        let query = parse_query(raw_query, MAX_TOKENS);
        if !query.has_tokens() {
            return Ok(Vec::new());
        }

        let hits = self.backend.search(Some(&base), &query).await?;
        Ok(hits.into_iter().map(|h| h.company_id).collect())
    }

    /// Unscoped search, for callers that want scores with their ids.
    pub async fn search(&self, raw_query: &str, limit: Option<usize>) -> Result<Vec<SearchHit>> {
        let query = parse_query(raw_query, MAX_TOKENS);
        if !query.has_tokens() {
            return Ok(Vec::new());
        }

        let mut hits = self.backend.search(None, &query).await?;
        if let Some(limit) = limit {
            hits.truncate(limit);
        }
        Ok(hits)
    }

    /// Match reasons for a page of already-ranked companies.
    pub async fn explain(
        &self,
        ids: &[i32],
        raw_query: &str,
        max_reasons: Option<usize>,
    ) -> Result<HashMap<i32, SearchExplain>> {
        let query = parse_query(raw_query, MAX_TOKENS);
        if !query.has_tokens() {
            return Ok(HashMap::new());
        }

        self.backend
            .explain(ids, &query, max_reasons.unwrap_or(MAX_REASONS))
            .await
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::domain::company::{Company, CompanyRelated};
    use crate::domain::search::backend::PrimaryBackend;
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

    fn service(store: MockSearchStore) -> SearchService {
        SearchService::new(Arc::new(PrimaryBackend::new(Arc::new(store))))
    }

    #[test]
    fn unknown_backend_kind_resolves_to_primary() {
        assert_eq!(SearchBackendKind::parse("primary"), SearchBackendKind::Primary);
        assert_eq!(SearchBackendKind::parse("searchbox"), SearchBackendKind::Searchbox);
        assert_eq!(SearchBackendKind::parse("SEARCHBOX"), SearchBackendKind::Searchbox);
        assert_eq!(SearchBackendKind::parse("elastic"), SearchBackendKind::Primary);
        assert_eq!(SearchBackendKind::parse(""), SearchBackendKind::Primary);
    }

    #[tokio::test]
    async fn empty_query_returns_base_unchanged() {
        let store = MockSearchStore::new()
            .with_indexed_company(make_company(1, "Ромашка"), CompanyRelated::default());
        let service = service(store);

        let base = vec![3, 1, 2];
        assert_eq!(service.apply(base.clone(), "").await.unwrap(), base);
        assert_eq!(service.apply(base.clone(), "   ").await.unwrap(), base);
    }

    #[tokio::test]
    async fn zero_token_query_returns_empty_set() {
        let store = MockSearchStore::new()
            .with_indexed_company(make_company(1, "Ромашка"), CompanyRelated::default());
        let service = service(store);

        assert!(service.apply(vec![1], "??").await.unwrap().is_empty());
        assert!(service.apply(vec![1], "а").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn apply_respects_the_base_scope() {
        let store = MockSearchStore::new()
            .with_indexed_company(make_company(1, "Ромашка"), CompanyRelated::default())
            .with_indexed_company(make_company(2, "Ромашка-2"), CompanyRelated::default());
        let service = service(store);

        let result = service.apply(vec![2], "ромашка").await.unwrap();
        assert_eq!(result, vec![2]);
    }

    #[tokio::test]
    async fn search_truncates_to_limit() {
        let store = MockSearchStore::new()
            .with_indexed_company(make_company(1, "Ромашка"), CompanyRelated::default())
            .with_indexed_company(make_company(2, "Ромашка-2"), CompanyRelated::default())
            .with_indexed_company(make_company(3, "Ромашка-3"), CompanyRelated::default());
        let service = service(store);

        let hits = service.search("ромашка", Some(2)).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn explain_of_zero_token_query_is_empty() {
        let store = MockSearchStore::new()
            .with_indexed_company(make_company(1, "Ромашка"), CompanyRelated::default());
        let service = service(store);

        let explains = service.explain(&[1], "-", None).await.unwrap();
        assert!(explains.is_empty());
    }
}
