//! In-memory store implementation for testing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::domain::company::{Company, CompanyRelated};
use crate::domain::search::document::build_document;
use crate::domain::search::ranking::literal_match;
use crate::domain::search::text::fold;
use crate::domain::search::traits::{CandidateSet, Result, SearchStore};
use crate::domain::search::types::{ParsedQuery, SearchDocument, UnindexedMatch};

/// Mock search store backed by in-memory maps.
///
/// # Examples
///
/// ```ignore
/// let store = MockSearchStore::new()
///     .with_indexed_company(company, related)
///     .with_unindexed_company(fresh_company, CompanyRelated::default());
/// ```
#[derive(Clone, Default)]
pub struct MockSearchStore {
    companies: Arc<RwLock<HashMap<i32, Company>>>,
    related: Arc<RwLock<HashMap<i32, CompanyRelated>>>,
    documents: Arc<RwLock<HashMap<i32, SearchDocument>>>,
}

#[allow(dead_code)]
impl MockSearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a company with its related rows and build its index row, as if
    /// a rebuild had already run.
    pub fn with_indexed_company(self, company: Company, related: CompanyRelated) -> Self {
        let doc = build_document(&company, &related);
        self.documents.write().unwrap().insert(company.id, doc);
        self.related.write().unwrap().insert(company.id, related);
        self.companies.write().unwrap().insert(company.id, company);
        self
    }

    /// Add a company without an index row, as freshly created records are
    /// before their first rebuild.
    pub fn with_unindexed_company(self, company: Company, related: CompanyRelated) -> Self {
        self.related.write().unwrap().insert(company.id, related);
        self.companies.write().unwrap().insert(company.id, company);
        self
    }

    /// Drop the company row but keep any index row, simulating a deletion
    /// that has not propagated to the index yet.
    pub fn remove_company(&self, company_id: i32) {
        self.companies.write().unwrap().remove(&company_id);
        self.related.write().unwrap().remove(&company_id);
    }

    pub fn document_count(&self) -> usize {
        self.documents.read().unwrap().len()
    }
}

#[async_trait]
impl SearchStore for MockSearchStore {
    async fn candidates(
        &self,
        scope: Option<&[i32]>,
        query: &ParsedQuery,
    ) -> Result<CandidateSet> {
        let in_scope = |id: i32| scope.map_or(true, |ids| ids.contains(&id));

        let documents = self.documents.read().unwrap();
        let indexed: Vec<SearchDocument> = documents
            .values()
            .filter(|doc| in_scope(doc.company_id))
            .cloned()
            .collect();

        let companies = self.companies.read().unwrap();
        let unindexed: Vec<UnindexedMatch> = companies
            .values()
            .filter(|c| in_scope(c.id) && !documents.contains_key(&c.id))
            .filter(|c| literal_match(c, query))
            .map(|c| UnindexedMatch {
                company_id: c.id,
                updated_at: c.updated_at,
            })
            .collect();

        Ok(CandidateSet { indexed, unindexed })
    }

    async fn get_document(&self, company_id: i32) -> Result<Option<SearchDocument>> {
        Ok(self.documents.read().unwrap().get(&company_id).cloned())
    }

    async fn rebuild_company(&self, company_id: i32) -> Result<Option<SearchDocument>> {
        // The whole read-modify-write happens under the documents write
        // lock, which serializes concurrent rebuilds of the same company
        // the way the advisory lock does in Postgres.
        let mut documents = self.documents.write().unwrap();
        let companies = self.companies.read().unwrap();
        let Some(company) = companies.get(&company_id) else {
            return Ok(None);
        };
        let related = self
            .related
            .read()
            .unwrap()
            .get(&company_id)
            .cloned()
            .unwrap_or_default();

        let doc = build_document(company, &related);
        documents.insert(company_id, doc.clone());
        Ok(Some(doc))
    }

    async fn delete_document(&self, company_id: i32) -> Result<bool> {
        Ok(self.documents.write().unwrap().remove(&company_id).is_some())
    }

    async fn load_companies(&self, ids: &[i32]) -> Result<Vec<Company>> {
        let companies = self.companies.read().unwrap();
        Ok(ids.iter().filter_map(|id| companies.get(id).cloned()).collect())
    }

    async fn load_related(
        &self,
        ids: &[i32],
        token_forms: &[String],
    ) -> Result<HashMap<i32, CompanyRelated>> {
        let related = self.related.read().unwrap();
        let mut out = HashMap::with_capacity(ids.len());
        for id in ids {
            let Some(rel) = related.get(id) else { continue };
            let mut rel = rel.clone();
            if !token_forms.is_empty() {
                rel.notes
                    .retain(|n| contains_any(&n.body, token_forms));
                rel.tasks.retain(|t| {
                    contains_any(&t.title, token_forms)
                        || t.description
                            .as_deref()
                            .is_some_and(|d| contains_any(d, token_forms))
                });
            }
            out.insert(*id, rel);
        }
        Ok(out)
    }

    async fn company_ids_page(&self, after_id: i32, limit: i64) -> Result<Vec<i32>> {
        let companies = self.companies.read().unwrap();
        let mut ids: Vec<i32> = companies.keys().copied().filter(|id| *id > after_id).collect();
        ids.sort_unstable();
        ids.truncate(limit as usize);
        Ok(ids)
    }
}

fn contains_any(value: &str, token_forms: &[String]) -> bool {
    let folded = fold(value);
    token_forms.iter().any(|t| folded.contains(t.as_str()))
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::domain::company::Note;
    use crate::domain::search::parser::{parse_query, MAX_TOKENS};

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
    async fn rebuild_creates_and_overwrites_documents() {
        let store = MockSearchStore::new()
            .with_unindexed_company(make_company(1, "Ромашка"), CompanyRelated::default());
        assert_eq!(store.document_count(), 0);

        let first = store.rebuild_company(1).await.unwrap().unwrap();
        let second = store.rebuild_company(1).await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(store.document_count(), 1);
    }

    #[tokio::test]
    async fn rebuild_of_missing_company_returns_none() {
        let store = MockSearchStore::new();
        assert!(store.rebuild_company(404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unindexed_companies_literal_match() {
        let store = MockSearchStore::new()
            .with_unindexed_company(make_company(1, "ООО Ромашка"), CompanyRelated::default())
            .with_unindexed_company(make_company(2, "Василёк"), CompanyRelated::default());

        let query = parse_query("ромашка", MAX_TOKENS);
        let candidates = store.candidates(None, &query).await.unwrap();
        assert!(candidates.indexed.is_empty());
        assert_eq!(candidates.unindexed.len(), 1);
        assert_eq!(candidates.unindexed[0].company_id, 1);
    }

    #[tokio::test]
    async fn scope_restricts_candidates() {
        let store = MockSearchStore::new()
            .with_indexed_company(make_company(1, "Ромашка"), CompanyRelated::default())
            .with_indexed_company(make_company(2, "Ромашка-2"), CompanyRelated::default());

        let query = parse_query("ромашка", MAX_TOKENS);
        let candidates = store.candidates(Some(&[2]), &query).await.unwrap();
        assert_eq!(candidates.indexed.len(), 1);
        assert_eq!(candidates.indexed[0].company_id, 2);
    }

    #[tokio::test]
    async fn related_notes_are_prefiltered_by_tokens() {
        let related = CompanyRelated {
            notes: vec![
                Note {
                    id: 1,
                    company_id: 1,
                    body: "обсуждали ромашку".to_string(),
                },
                Note {
                    id: 2,
                    company_id: 1,
                    body: "другая тема".to_string(),
                },
            ],
            ..Default::default()
        };
        let store =
            MockSearchStore::new().with_indexed_company(make_company(1, "Ромашка"), related);

        let loaded = store
            .load_related(&[1], &["ромашк".to_string()])
            .await
            .unwrap();
        assert_eq!(loaded[&1].notes.len(), 1);
    }

    #[tokio::test]
    async fn company_ids_page_orders_and_limits() {
        let store = MockSearchStore::new()
            .with_unindexed_company(make_company(3, "c"), CompanyRelated::default())
            .with_unindexed_company(make_company(1, "a"), CompanyRelated::default())
            .with_unindexed_company(make_company(2, "b"), CompanyRelated::default());

        assert_eq!(store.company_ids_page(0, 2).await.unwrap(), vec![1, 2]);
        assert_eq!(store.company_ids_page(2, 2).await.unwrap(), vec![3]);
    }
}
