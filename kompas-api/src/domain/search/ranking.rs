//! Ranking service: conjunctive filtering plus weighted rank fusion over
//! search documents.

use std::cmp::Ordering;

use crate::domain::company::Company;

use super::text::{digits_only, fold};
use super::types::{ParsedQuery, SearchDocument, SearchHit, TextGroup, UnindexedMatch};

/// Boost per strong digit token that is a near-complete phone or ID.
const NEAR_COMPLETE_DIGIT_BOOST: f64 = 3.0;
/// Boost per shorter strong digit token.
const STRONG_DIGIT_BOOST: f64 = 0.7;
/// Weak digit tokens only nudge the score.
const WEAK_DIGIT_WEIGHT: f64 = 0.3;

/// Rank indexed documents against a parsed query and append literal
/// fallback matches for companies that have no index row yet.
///
/// Queries that produced no tokens at all ("??", a lone letter) match
/// nothing; they must never degenerate into a full scan.
pub fn rank(
    indexed: &[SearchDocument],
    unindexed: &[UnindexedMatch],
    query: &ParsedQuery,
) -> Vec<SearchHit> {
    if !query.has_tokens() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = indexed
        .iter()
        .filter_map(|doc| {
            score_document(doc, query).map(|score| SearchHit {
                company_id: doc.company_id,
                score,
                updated_at: doc.updated_at,
            })
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });

    // Unindexed companies score zero and sort after every indexed match.
    let mut tail: Vec<SearchHit> = unindexed
        .iter()
        .map(|m| SearchHit {
            company_id: m.company_id,
            score: 0.0,
            updated_at: m.updated_at,
        })
        .collect();
    tail.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    hits.extend(tail);

    hits
}

/// Apply the conjunctive filter and compute the fused score. `None` means
/// the document does not match.
///
/// Strong digit tokens and text tokens are all required; weak digit
/// tokens only contribute to the score. A query carrying nothing but weak
/// tokens still requires them, otherwise two stray digits would match the
/// whole table.
fn score_document(doc: &SearchDocument, query: &ParsedQuery) -> Option<f64> {
    for token in &query.strong_digits {
        if !token.matches(&doc.digits) {
            return None;
        }
    }
    for token in &query.text_tokens {
        if !doc.plain.contains(token.as_str()) {
            return None;
        }
    }
    let weak_only = query.text_tokens.is_empty() && query.strong_digits.is_empty();
    if weak_only && !query.weak_digits.iter().all(|t| doc.digits.contains(t.as_str())) {
        return None;
    }

    let mut score = 0.0;
    for token in &query.text_tokens {
        for group in TextGroup::ALL {
            if doc.group(group).contains(token.as_str()) {
                score += group.weight();
            }
        }
    }
    for token in &query.strong_digits {
        score += if token.is_near_complete() {
            NEAR_COMPLETE_DIGIT_BOOST
        } else {
            STRONG_DIGIT_BOOST
        };
    }
    for token in &query.weak_digits {
        if doc.digits.contains(token.as_str()) {
            score += WEAK_DIGIT_WEIGHT;
        }
    }

    Some(score)
}

/// Literal fallback match against a company's raw, un-indexed fields.
/// Used for companies created since their last index rebuild; shared by
/// every store implementation so the semantics cannot drift.
pub fn literal_match(company: &Company, query: &ParsedQuery) -> bool {
    if !query.has_tokens() {
        return false;
    }

    let haystack = fold(
        &[
            Some(company.name.as_str()),
            company.legal_name.as_deref(),
            company.tax_id.as_deref(),
            company.external_id.as_deref(),
            company.address.as_deref(),
            company.website.as_deref(),
            company.primary_email.as_deref(),
            company.secondary_email.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n"),
    );
    let digits = [
        company.tax_id.as_deref(),
        company.external_id.as_deref(),
        company.primary_phone.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(digits_only)
    .collect::<Vec<_>>()
    .join(" ");

    query.text_tokens.iter().all(|t| haystack.contains(t.as_str()))
        && query.strong_digits.iter().all(|t| t.matches(&digits))
        && (!query.text_tokens.is_empty()
            || !query.strong_digits.is_empty()
            || query.weak_digits.iter().all(|t| digits.contains(t.as_str())))
}
