//! Company search and relevance ranking.
//!
//! This module turns a raw query string into a filtered, ordered,
//! explainable set of companies:
//!
//! - **Folding** (`text`) normalizes text at index and query time.
//! - **Parsing** (`parser`) classifies input into text tokens, strong
//!   and weak digit tokens, or a single exact value (phone, email).
//! - **Indexing** (`document`, `indexer`) denormalizes each company
//!   and its related rows into four weighted text groups plus a digits
//!   blob, rebuilt on demand under a per-company lock.
//! - **Ranking** (`ranking`) AND-filters on strong tokens and fuses
//!   per-group scores (10 : 5 : 2 : 1) with digit-match boosts.
//! - **Explaining** (`explain`, `highlight`) justifies every returned
//!   company with highlighted per-field match reasons.
//!
//! # Backends
//!
//! Both engines implement [`SearchBackend`]:
//!
//! - [`PrimaryBackend`] ranks the relational index documents directly.
//! - [`RemoteBackend`] queries the external Searchbox service with
//!   equivalent weights, synonyms and stopwords.
//! - [`FallbackBackend`] composes the two: remote unavailability is
//!   logged and silently served by the primary engine.
//!
//! The backend is selected once at startup ([`SearchBackendKind`]) and
//! injected through [`SearchService`]:
//!
//! ```ignore
//! let store = Arc::new(PgSearchStore::new(pool));
//! let service = SearchService::new(Arc::new(PrimaryBackend::new(store)));
//!
//! let ids = service.apply(base_ids, "7701 ромашка").await?;
//! let explains = service.explain(&ids, "7701 ромашка", None).await?;
//! ```

pub mod backend;
mod document;
mod explain;
mod highlight;
mod index_worker;
mod indexer;
mod parser;
mod ranking;
pub mod repository;
mod service;
mod text;
mod traits;
mod types;

pub use backend::{FallbackBackend, PrimaryBackend, RemoteBackend, RemoteIndex};
pub use document::build_document;
pub use explain::MAX_REASONS;
pub use highlight::highlight;
pub use index_worker::run_index_worker;
pub use indexer::{IndexerConfig, SearchIndexer};
pub use parser::{parse_query, MAX_TOKENS};
pub use service::{SearchBackendKind, SearchService};
pub use traits::{CandidateSet, Result, SearchBackend, SearchError, SearchStore};
pub use types::{
    DigitToken, ParsedQuery, RebuildStats, SearchDocument, SearchExplain, SearchHit,
    SearchReason, TextGroup, UnindexedMatch,
};
