//! Client for the Searchbox document-search service (a Meilisearch-compatible
//! HTTP API): index lifecycle, settings and search queries with highlighting.

mod client;
mod query;
mod settings;

pub use client::*;
pub use query::*;
pub use settings::*;
