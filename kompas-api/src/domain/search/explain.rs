//! Explainability engine: builds per-field match reasons for a page of
//! search results.
//!
//! Reasons are generated in a fixed priority order, highlighted, then
//! filtered down to the ones whose value literally contains every query
//! token. When the tokens were satisfied by *different* fields (a contact
//! name here, a phone number there) strict filtering removes everything;
//! in that case the top unfiltered reasons are kept instead, so a company
//! present in the result set never gets an empty explanation. That
//! fallback is an intentional product decision, not a bug.

use std::collections::HashMap;

use itertools::Itertools;

use crate::domain::company::{Company, CompanyRelated};

use super::highlight::highlight;
use super::text::{digits_only, fold};
use super::traits::{Result, SearchStore};
use super::types::{ParsedQuery, SearchExplain, SearchReason};

/// Default cap on reasons per company.
pub const MAX_REASONS: usize = 50;
/// How many unfiltered reasons to keep when strict filtering removes all.
const FALLBACK_REASONS: usize = 10;

/// Explain a page of companies. Related rows are bulk-loaded for the
/// whole page; nothing is fetched per company.
pub async fn explain_companies<S: SearchStore + ?Sized>(
    store: &S,
    ids: &[i32],
    query: &ParsedQuery,
    max_reasons: usize,
) -> Result<HashMap<i32, SearchExplain>> {
    if ids.is_empty() || !query.has_tokens() {
        return Ok(HashMap::new());
    }

    let companies = store.load_companies(ids).await?;
    let mut related = store.load_related(ids, &query.all_token_forms()).await?;

    let mut explains = HashMap::with_capacity(companies.len());
    for company in &companies {
        let rel = related.remove(&company.id).unwrap_or_default();
        explains.insert(company.id, explain_one(company, &rel, query, max_reasons));
    }
    Ok(explains)
}

fn explain_one(
    company: &Company,
    related: &CompanyRelated,
    query: &ParsedQuery,
    max_reasons: usize,
) -> SearchExplain {
    let candidates = candidate_reasons(company, related, query);
    let total_reasons = candidates.len();

    let filtered: Vec<SearchReason> = candidates
        .iter()
        .filter(|r| reason_contains_query(&r.value, query))
        .cloned()
        .collect();

    let mut reasons = if filtered.is_empty() {
        candidates.into_iter().take(FALLBACK_REASONS).collect()
    } else {
        filtered
    };
    reasons = reasons
        .into_iter()
        .unique_by(|r| (r.field.clone(), r.value.clone()))
        .take(max_reasons)
        .collect();

    SearchExplain {
        company_id: company.id,
        reasons,
        total_reasons,
        name_html: mark(query, &company.name),
        tax_id_html: mark(query, company.tax_id.as_deref().unwrap_or_default()),
        address_html: mark(query, company.address.as_deref().unwrap_or_default()),
    }
}

/// Candidate reasons in priority order: identifiers, names, primary
/// contact data, additional phones and emails, contacts, metadata, then
/// activity (notes and tasks).
fn candidate_reasons(
    company: &Company,
    related: &CompanyRelated,
    query: &ParsedQuery,
) -> Vec<SearchReason> {
    let mut reasons: Vec<SearchReason> = Vec::new();
    let mut push = |field: &str, label: &str, value: Option<&str>| {
        let Some(value) = value.map(str::trim) else {
            return;
        };
        if value.is_empty() {
            return;
        }
        reasons.push(SearchReason {
            field: field.to_string(),
            label: label.to_string(),
            value: value.to_string(),
            highlighted: mark(query, value),
        });
    };

    push("tax_id", "Tax ID", company.tax_id.as_deref());
    push("external_id", "External ID", company.external_id.as_deref());
    push("name", "Name", Some(&company.name));
    push("legal_name", "Legal name", company.legal_name.as_deref());
    push("primary_phone", "Phone", company.primary_phone.as_deref());
    push("primary_email", "Email", company.primary_email.as_deref());
    push("secondary_email", "Email", company.secondary_email.as_deref());
    for phone in &related.phones {
        push("phone", "Phone", Some(&phone.number));
    }
    for email in &related.emails {
        push("email", "Email", Some(&email.address));
    }
    for contact in &related.contacts {
        push("contact", "Contact", Some(&contact.full_name));
        push("contact_title", "Contact title", contact.title.as_deref());
        for phone in related.phones_of(contact.id) {
            push("contact_phone", "Contact phone", Some(&phone.number));
        }
        for email in related.emails_of(contact.id) {
            push("contact_email", "Contact email", Some(&email.address));
        }
        push("contact_note", "Contact note", contact.note.as_deref());
    }
    push("address", "Address", company.address.as_deref());
    push("website", "Website", company.website.as_deref());
    push("schedule", "Schedule", company.schedule.as_deref());
    for note in &related.notes {
        push("note", "Note", Some(&note.body));
    }
    for task in &related.tasks {
        push("task", "Task", Some(&task.title));
        push("task", "Task", task.description.as_deref());
    }

    reasons
}

/// A reason survives strict filtering only when its value alone contains
/// every text token and every strong digit token (either variant form).
/// This drops values that matched through database-level fuzziness only.
fn reason_contains_query(value: &str, query: &ParsedQuery) -> bool {
    let folded = fold(value);
    let digits = digits_only(value);
    query.text_tokens.iter().all(|t| folded.contains(t.as_str()))
        && query.strong_digits.iter().all(|t| t.matches(&digits))
}

fn mark(query: &ParsedQuery, value: &str) -> String {
    highlight(value, &query.text_tokens, &query.strong_digits)
}
