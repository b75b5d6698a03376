//! Alternate search backend over the external Searchbox service.
//!
//! The remote index mirrors the denormalized search documents; query
//! translation keeps the per-group weighting by listing the groups as
//! searchable attributes in priority order, with domestic legal-form
//! abbreviations as stopwords and common address abbreviations as
//! synonyms. Match reasons are still built locally from the relational
//! store so both backends justify results identically.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use searchbox::{IndexSettings, SearchQuery, SearchboxClient};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;

use crate::domain::search::explain::explain_companies;
use crate::domain::search::traits::{Result, SearchBackend, SearchStore};
use crate::domain::search::types::{ParsedQuery, SearchDocument, SearchExplain, SearchHit};

/// Hard cap on results pulled from the remote service per query.
const REMOTE_RESULT_CAP: usize = 1000;

/// Domestic organizational-form abbreviations carry no signal.
const STOP_WORDS: &[&str] = &["ооо", "зао", "оао", "пао", "ао", "ип", "нко", "гк"];

fn address_synonyms() -> BTreeMap<String, Vec<String>> {
    let groups: &[&[&str]] = &[
        &["ул", "улица"],
        &["пр", "проспект", "пр-т"],
        &["пер", "переулок"],
        &["наб", "набережная"],
        &["ш", "шоссе"],
        &["г", "город"],
        &["д", "дом"],
        &["обл", "область"],
        &["стр", "строение"],
    ];

    let mut synonyms = BTreeMap::new();
    for group in groups {
        for word in *group {
            let rest: Vec<String> = group
                .iter()
                .filter(|w| *w != word)
                .map(|w| w.to_string())
                .collect();
            synonyms.insert(word.to_string(), rest);
        }
    }
    synonyms
}

/// The document shape stored in the remote index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub id: i32,
    pub identifiers: String,
    pub names: String,
    pub contacts: String,
    pub other: String,
    pub digits: String,
    /// Unix timestamp; the remote service sorts on plain numbers.
    pub updated_at: i64,
}

impl From<&SearchDocument> for RemoteDocument {
    fn from(doc: &SearchDocument) -> Self {
        Self {
            id: doc.company_id,
            identifiers: doc.identifiers.clone(),
            names: doc.names.clone(),
            contacts: doc.contacts.clone(),
            other: doc.other.clone(),
            digits: doc.digits.clone(),
            updated_at: doc.updated_at.unix_timestamp(),
        }
    }
}

/// Handle on the remote companies index: lazy idempotent schema setup and
/// incremental document maintenance.
///
/// The maintenance calls return a success flag instead of an error: a
/// transient remote failure must not fail the rebuild that triggered it.
#[derive(Clone)]
pub struct RemoteIndex {
    client: SearchboxClient,
    uid: String,
    ready: Arc<AtomicBool>,
}

impl RemoteIndex {
    pub fn new(client: SearchboxClient, uid: impl Into<String>) -> Self {
        Self {
            client,
            uid: uid.into(),
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create the index and push its settings if this process has not done
    /// so yet. Safe to call on every request; repeat runs are no-ops on
    /// the remote side too.
    pub async fn ensure_ready(&self) -> Result<()> {
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }

        self.client.ensure_index(&self.uid, "id").await?;
        let settings = IndexSettings::default()
            .searchable(
                ["identifiers", "names", "contacts", "other", "digits"]
                    .map(String::from)
                    .to_vec(),
            )
            .sortable(vec!["updated_at".to_string()])
            .ranking_rules(
                [
                    "words",
                    "typo",
                    "proximity",
                    "attribute",
                    "sort",
                    "exactness",
                    "updated_at:desc",
                ]
                .map(String::from)
                .to_vec(),
            )
            .stop_words(STOP_WORDS.iter().map(|w| w.to_string()).collect())
            .synonyms(address_synonyms());
        self.client.update_settings(&self.uid, &settings).await?;

        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    /// Add or replace one document in the remote index.
    pub async fn index_one(&self, doc: &SearchDocument) -> bool {
        let outcome = async {
            self.ensure_ready().await?;
            self.client
                .add_documents(&self.uid, &[RemoteDocument::from(doc)])
                .await?;
            Ok::<(), crate::domain::search::traits::SearchError>(())
        }
        .await;

        if let Err(e) = outcome {
            warn!(company_id = doc.company_id, error = %e, "Failed to push document to remote index");
            return false;
        }
        true
    }

    /// Remove one document from the remote index.
    pub async fn delete_one(&self, company_id: i32) -> bool {
        if let Err(e) = self.client.delete_document(&self.uid, company_id).await {
            warn!(company_id, error = %e, "Failed to delete document from remote index");
            return false;
        }
        true
    }
}

pub struct RemoteBackend<S> {
    index: RemoteIndex,
    store: Arc<S>,
}

impl<S> RemoteBackend<S> {
    pub fn new(index: RemoteIndex, store: Arc<S>) -> Self {
        Self { index, store }
    }

    /// Query string for the remote engine: every text token plus every
    /// form of every strong digit token.
    fn remote_query(query: &ParsedQuery) -> String {
        let mut parts: Vec<&str> = query.text_tokens.iter().map(String::as_str).collect();
        for token in &query.strong_digits {
            parts.extend(token.forms());
        }
        parts.extend(query.weak_digits.iter().map(String::as_str));
        parts.join(" ")
    }
}

#[async_trait]
impl<S: SearchStore> SearchBackend for RemoteBackend<S> {
    async fn search(&self, scope: Option<&[i32]>, query: &ParsedQuery) -> Result<Vec<SearchHit>> {
        if !query.has_tokens() {
            return Ok(Vec::new());
        }
        self.index.ensure_ready().await?;

        let request = SearchQuery::new(Self::remote_query(query))
            .with_limit(REMOTE_RESULT_CAP)
            .with_ranking_score();
        let results = self
            .index
            .client
            .search::<RemoteDocument>(&self.index.uid, &request)
            .await?;

        let hits = results
            .hits
            .into_iter()
            .filter(|hit| scope.map_or(true, |ids| ids.contains(&hit.document.id)))
            // The remote engine matches loosely (typos, synonyms); the
            // strong digit filter stays conjunctive on our side so both
            // backends agree on what a phone/ID query may return.
            .filter(|hit| {
                query
                    .strong_digits
                    .iter()
                    .all(|t| t.matches(&hit.document.digits))
            })
            .map(|hit| SearchHit {
                company_id: hit.document.id,
                score: hit.ranking_score.unwrap_or(0.0),
                updated_at: OffsetDateTime::from_unix_timestamp(hit.document.updated_at)
                    .unwrap_or(OffsetDateTime::UNIX_EPOCH),
            })
            .collect();

        Ok(hits)
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
