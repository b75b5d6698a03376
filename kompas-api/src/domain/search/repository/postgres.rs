//! PostgreSQL store implementation.
//!
//! Candidate retrieval pushes the conjunctive filter into SQL over the
//! folded index columns; exact match semantics are enforced again by the
//! ranking service, so the two cannot drift apart. Rebuilds serialize per
//! company through a transaction-scoped advisory lock.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgConnection;
use sqlx::{PgPool, QueryBuilder};

use crate::domain::company::{
    Company, CompanyEmail, CompanyPhone, CompanyRelated, Contact, ContactEmail, ContactPhone,
    Note, Task,
};
use crate::domain::search::document::build_document;
use crate::domain::search::ranking::literal_match;
use crate::domain::search::traits::{CandidateSet, Result, SearchStore};
use crate::domain::search::types::{ParsedQuery, SearchDocument, UnindexedMatch};

/// Advisory lock namespace for index rebuilds, distinct from any other
/// lock class in the application.
const INDEX_LOCK_NS: i32 = 0x6b7073;

const COMPANY_COLUMNS: &str = "id, name, legal_name, tax_id, external_id, address, website, \
     schedule, primary_phone, primary_email, secondary_email, raw_import, created_at, updated_at";

#[derive(Clone)]
pub struct PgSearchStore {
    pool: PgPool,
}

impl PgSearchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `%token%` with LIKE metacharacters escaped.
fn like_pattern(token: &str) -> String {
    let escaped = token
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

async fn load_related_on(
    conn: &mut PgConnection,
    ids: &[i32],
    token_forms: &[String],
) -> Result<HashMap<i32, CompanyRelated>> {
    let mut related: HashMap<i32, CompanyRelated> = HashMap::with_capacity(ids.len());

    let phones: Vec<CompanyPhone> = sqlx::query_as(
        "SELECT id, company_id, number, kind FROM company_phones WHERE company_id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;
    for row in phones {
        related.entry(row.company_id).or_default().phones.push(row);
    }

    let emails: Vec<CompanyEmail> = sqlx::query_as(
        "SELECT id, company_id, address FROM company_emails WHERE company_id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;
    for row in emails {
        related.entry(row.company_id).or_default().emails.push(row);
    }

    let contacts: Vec<Contact> = sqlx::query_as(
        "SELECT id, company_id, full_name, title, status, note FROM contacts \
         WHERE company_id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;
    for row in contacts {
        related.entry(row.company_id).or_default().contacts.push(row);
    }

    let contact_phones: Vec<ContactPhone> = sqlx::query_as(
        "SELECT cp.id, cp.contact_id, ct.company_id, cp.number \
         FROM contact_phones cp JOIN contacts ct ON ct.id = cp.contact_id \
         WHERE ct.company_id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;
    for row in contact_phones {
        related
            .entry(row.company_id)
            .or_default()
            .contact_phones
            .push(row);
    }

    let contact_emails: Vec<ContactEmail> = sqlx::query_as(
        "SELECT ce.id, ce.contact_id, ct.company_id, ce.address \
         FROM contact_emails ce JOIN contacts ct ON ct.id = ce.contact_id \
         WHERE ct.company_id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;
    for row in contact_emails {
        related
            .entry(row.company_id)
            .or_default()
            .contact_emails
            .push(row);
    }

    // Notes and tasks can be arbitrarily long; when the caller passed the
    // query tokens, pull only the rows that could have matched.
    let patterns: Vec<String> = token_forms.iter().map(|t| like_pattern(t)).collect();

    let notes: Vec<Note> = if patterns.is_empty() {
        sqlx::query_as("SELECT id, company_id, body FROM notes WHERE company_id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *conn)
            .await?
    } else {
        sqlx::query_as(
            "SELECT id, company_id, body FROM notes \
             WHERE company_id = ANY($1) AND body ILIKE ANY($2)",
        )
        .bind(ids)
        .bind(&patterns)
        .fetch_all(&mut *conn)
        .await?
    };
    for row in notes {
        related.entry(row.company_id).or_default().notes.push(row);
    }

    let tasks: Vec<Task> = if patterns.is_empty() {
        sqlx::query_as(
            "SELECT id, company_id, title, description FROM tasks WHERE company_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?
    } else {
        sqlx::query_as(
            "SELECT id, company_id, title, description FROM tasks \
             WHERE company_id = ANY($1) \
               AND (title ILIKE ANY($2) OR description ILIKE ANY($2))",
        )
        .bind(ids)
        .bind(&patterns)
        .fetch_all(&mut *conn)
        .await?
    };
    for row in tasks {
        related.entry(row.company_id).or_default().tasks.push(row);
    }

    Ok(related)
}

#[async_trait]
impl SearchStore for PgSearchStore {
    async fn candidates(
        &self,
        scope: Option<&[i32]>,
        query: &ParsedQuery,
    ) -> Result<CandidateSet> {
        let mut qb = QueryBuilder::new(
            "SELECT company_id, identifiers, names, contacts, other, plain, digits, updated_at \
             FROM company_search_index WHERE 1 = 1",
        );
        if let Some(scope) = scope {
            qb.push(" AND company_id = ANY(");
            qb.push_bind(scope.to_vec());
            qb.push(")");
        }
        for token in &query.strong_digits {
            qb.push(" AND (");
            for (i, form) in token.forms().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push("digits LIKE ");
                qb.push_bind(like_pattern(form));
            }
            qb.push(")");
        }
        for token in &query.text_tokens {
            qb.push(" AND plain LIKE ");
            qb.push_bind(like_pattern(token));
        }
        if query.text_tokens.is_empty() && query.strong_digits.is_empty() {
            for token in &query.weak_digits {
                qb.push(" AND digits LIKE ");
                qb.push_bind(like_pattern(token));
            }
        }

        let indexed: Vec<SearchDocument> =
            qb.build_query_as().fetch_all(&self.pool).await?;

        // Companies without an index row yet: load the few fresh rows and
        // apply the shared literal match in code.
        let mut qb = QueryBuilder::new(format!(
            "SELECT {} FROM companies c \
             LEFT JOIN company_search_index i ON i.company_id = c.id \
             WHERE i.company_id IS NULL",
            COMPANY_COLUMNS
                .split(", ")
                .map(|c| format!("c.{c}"))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        if let Some(scope) = scope {
            qb.push(" AND c.id = ANY(");
            qb.push_bind(scope.to_vec());
            qb.push(")");
        }
        let fresh: Vec<Company> = qb.build_query_as().fetch_all(&self.pool).await?;
        let unindexed = fresh
            .into_iter()
            .filter(|c| literal_match(c, query))
            .map(|c| UnindexedMatch {
                company_id: c.id,
                updated_at: c.updated_at,
            })
            .collect();

        Ok(CandidateSet { indexed, unindexed })
    }

    async fn get_document(&self, company_id: i32) -> Result<Option<SearchDocument>> {
        let doc = sqlx::query_as(
            "SELECT company_id, identifiers, names, contacts, other, plain, digits, updated_at \
             FROM company_search_index WHERE company_id = $1",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(doc)
    }

    async fn rebuild_company(&self, company_id: i32) -> Result<Option<SearchDocument>> {
        let mut tx = self.pool.begin().await?;

        // Exclusive per-company critical section for the whole
        // read-modify-write; released on commit or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(INDEX_LOCK_NS)
            .bind(company_id)
            .execute(&mut *tx)
            .await?;

        let company: Option<Company> = sqlx::query_as(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"
        ))
        .bind(company_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(company) = company else {
            tx.commit().await?;
            return Ok(None);
        };

        let related = load_related_on(&mut *tx, &[company_id], &[])
            .await?
            .remove(&company_id)
            .unwrap_or_default();
        let doc = build_document(&company, &related);

        sqlx::query(
            "INSERT INTO company_search_index \
                 (company_id, identifiers, names, contacts, other, plain, digits, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (company_id) DO UPDATE SET \
                 identifiers = EXCLUDED.identifiers, \
                 names = EXCLUDED.names, \
                 contacts = EXCLUDED.contacts, \
                 other = EXCLUDED.other, \
                 plain = EXCLUDED.plain, \
                 digits = EXCLUDED.digits, \
                 updated_at = EXCLUDED.updated_at, \
                 indexed_at = now()",
        )
        .bind(doc.company_id)
        .bind(&doc.identifiers)
        .bind(&doc.names)
        .bind(&doc.contacts)
        .bind(&doc.other)
        .bind(&doc.plain)
        .bind(&doc.digits)
        .bind(doc.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(doc))
    }

    async fn delete_document(&self, company_id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM company_search_index WHERE company_id = $1")
            .bind(company_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn load_companies(&self, ids: &[i32]) -> Result<Vec<Company>> {
        let companies = sqlx::query_as(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(companies)
    }

    async fn load_related(
        &self,
        ids: &[i32],
        token_forms: &[String],
    ) -> Result<HashMap<i32, CompanyRelated>> {
        let mut conn = self.pool.acquire().await?;
        load_related_on(&mut conn, ids, token_forms).await
    }

    async fn company_ids_page(&self, after_id: i32, limit: i64) -> Result<Vec<i32>> {
        let ids = sqlx::query_scalar(
            "SELECT id FROM companies WHERE id > $1 ORDER BY id LIMIT $2",
        )
        .bind(after_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("abc"), "%abc%");
        assert_eq!(like_pattern("a%b"), "%a\\%b%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
