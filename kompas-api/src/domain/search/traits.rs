//! Trait definitions for the search domain abstractions.
//!
//! Both backends implement [`SearchBackend`]; storage goes through
//! [`SearchStore`] so the engine can run against Postgres in production
//! and an in-memory mock in tests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::company::{Company, CompanyRelated};

use super::types::{ParsedQuery, SearchDocument, SearchExplain, SearchHit, UnindexedMatch};

/// Error type for search operations.
#[allow(dead_code)]
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// The remote search backend could not be reached or answered with
    /// something unusable. Recoverable by falling back to primary.
    #[error("Search backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("{0}")]
    Other(String),
}

impl From<sqlx::Error> for SearchError {
    fn from(e: sqlx::Error) -> Self {
        SearchError::DatabaseError(e.to_string())
    }
}

impl From<searchbox::SearchboxError> for SearchError {
    fn from(e: searchbox::SearchboxError) -> Self {
        SearchError::BackendUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// A search backend: exactly `search` and `explain`, one implementation
/// per engine plus the fallback wrapper composing two of them.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Filter and order companies for a parsed query. `scope` restricts
    /// the candidate set to the given ids; `None` searches everything.
    async fn search(&self, scope: Option<&[i32]>, query: &ParsedQuery) -> Result<Vec<SearchHit>>;

    /// Build match reasons for a page of already-ranked companies.
    ///
    /// Every requested company that exists gets a non-empty reason list.
    async fn explain(
        &self,
        ids: &[i32],
        query: &ParsedQuery,
        max_reasons: usize,
    ) -> Result<HashMap<i32, SearchExplain>>;
}

/// Candidates for one query: indexed documents (filtered and scored by the
/// ranking service) plus companies without an index row that matched
/// literally against their raw fields.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub indexed: Vec<SearchDocument>,
    pub unindexed: Vec<UnindexedMatch>,
}

/// Storage operations of the search subsystem.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Candidate documents for a query, optionally restricted to a scope.
    /// Implementations may pre-filter loosely; exact match semantics are
    /// enforced by the ranking service.
    async fn candidates(&self, scope: Option<&[i32]>, query: &ParsedQuery)
        -> Result<CandidateSet>;

    #[allow(dead_code)]
    async fn get_document(&self, company_id: i32) -> Result<Option<SearchDocument>>;

    /// Rebuild the index row for one company under an exclusive per-row
    /// lock (read related rows, build, upsert in one critical section).
    /// Returns `None` when the company no longer exists.
    async fn rebuild_company(&self, company_id: i32) -> Result<Option<SearchDocument>>;

    /// Remove the index row. Returns whether a row was deleted.
    async fn delete_document(&self, company_id: i32) -> Result<bool>;

    async fn load_companies(&self, ids: &[i32]) -> Result<Vec<Company>>;

    /// Bulk-load every related row for a page of companies in a bounded
    /// number of queries. Notes and tasks are pre-filtered by an OR of
    /// `token_forms` to bound how much text is pulled.
    async fn load_related(
        &self,
        ids: &[i32],
        token_forms: &[String],
    ) -> Result<HashMap<i32, CompanyRelated>>;

    /// Page of company ids for batch rebuilds, ordered by id.
    async fn company_ids_page(&self, after_id: i32, limit: i64) -> Result<Vec<i32>>;
}
