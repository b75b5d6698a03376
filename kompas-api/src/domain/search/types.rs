//! Core types for the company search domain.

use serde::Serialize;
use time::OffsetDateTime;

/// A digit run extracted from the query, at least four digits long.
///
/// Strong tokens AND-filter the result set. An 11-digit phone number keeps
/// both its 7- and 8-prefixed domestic forms as alternatives of one token:
/// a record matches the token when it contains *either* form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitToken {
    pub value: String,
    pub variant: Option<String>,
}

impl DigitToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            variant: None,
        }
    }

    pub fn with_variant(value: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            variant: Some(variant.into()),
        }
    }

    /// All forms of this token, primary first.
    pub fn forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.value.as_str()).chain(self.variant.as_deref())
    }

    /// True when either form occurs in the digit string.
    pub fn matches(&self, digits: &str) -> bool {
        self.forms().any(|form| digits.contains(form))
    }

    /// A near-complete phone or tax number carries far more signal than a
    /// short digit fragment and is boosted accordingly.
    pub fn is_near_complete(&self) -> bool {
        self.value.len() >= 9
    }
}

/// A user query classified into tokens. Ephemeral, request-scoped.
#[derive(Debug, Clone, Default)]
pub struct ParsedQuery {
    pub raw: String,
    /// Folded text tokens, deduplicated, each at least two characters.
    pub text_tokens: Vec<String>,
    /// Digit runs of four or more digits; AND-filter plus heavy boost.
    pub strong_digits: Vec<DigitToken>,
    /// Digit runs of two or three digits; a weak ranking signal only.
    pub weak_digits: Vec<String>,
}

impl ParsedQuery {
    pub fn has_tokens(&self) -> bool {
        !self.text_tokens.is_empty() || !self.strong_digits.is_empty() || !self.weak_digits.is_empty()
    }

    /// Every folded token form, used to pre-filter note/task loading.
    pub fn all_token_forms(&self) -> Vec<String> {
        let mut forms: Vec<String> = self.text_tokens.clone();
        for token in &self.strong_digits {
            forms.extend(token.forms().map(str::to_string));
        }
        forms.extend(self.weak_digits.iter().cloned());
        forms
    }
}

/// The four weighted text groups of a search document, most specific
/// first. Weights follow the 10 : 5 : 2 : 1 fusion scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextGroup {
    Identifiers,
    Names,
    Contacts,
    Other,
}

impl TextGroup {
    pub const ALL: [TextGroup; 4] = [
        TextGroup::Identifiers,
        TextGroup::Names,
        TextGroup::Contacts,
        TextGroup::Other,
    ];

    pub fn weight(self) -> f64 {
        match self {
            TextGroup::Identifiers => 10.0,
            TextGroup::Names => 5.0,
            TextGroup::Contacts => 2.0,
            TextGroup::Other => 1.0,
        }
    }
}

/// Denormalized search index record for one company. Fully derived from
/// the company and its related rows; rebuilt on every change, never
/// hand-edited.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SearchDocument {
    pub company_id: i32,
    /// Folded tax and external identifiers.
    pub identifiers: String,
    /// Folded names with punctuation-normalized and glued variants.
    pub names: String,
    /// Folded contact and person fields.
    pub contacts: String,
    /// Folded address, website, notes, tasks and bounded raw import.
    pub other: String,
    /// Fold of all groups concatenated.
    pub plain: String,
    /// Space-joined digit projections of every phone- and ID-like field.
    pub digits: String,
    pub updated_at: OffsetDateTime,
}

impl SearchDocument {
    pub fn group(&self, group: TextGroup) -> &str {
        match group {
            TextGroup::Identifiers => &self.identifiers,
            TextGroup::Names => &self.names,
            TextGroup::Contacts => &self.contacts,
            TextGroup::Other => &self.other,
        }
    }
}

/// A company that has no index row yet but matched the query literally
/// against its raw fields. Such companies stay searchable between creation
/// and the first index rebuild; they rank after every indexed match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnindexedMatch {
    pub company_id: i32,
    pub updated_at: OffsetDateTime,
}

/// One ranked search result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub company_id: i32,
    pub score: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A single human-readable justification for why a company matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReason {
    /// Stable field identifier, e.g. `tax_id` or `contact_phone`.
    pub field: String,
    /// Human label for the field.
    pub label: String,
    /// The matched value as stored.
    pub value: String,
    /// The value with matches wrapped in `<mark>`, HTML-escaped.
    pub highlighted: String,
}

/// The explanation of one search result: match reasons plus highlighted
/// snippets for the compact result row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchExplain {
    pub company_id: i32,
    pub reasons: Vec<SearchReason>,
    /// Number of candidate reasons before capping.
    pub total_reasons: usize,
    pub name_html: String,
    pub tax_id_html: String,
    pub address_html: String,
}

/// Statistics of a batch index rebuild.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildStats {
    pub rebuilt: usize,
    pub deleted: usize,
    pub errors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_token_matches_either_form() {
        let token = DigitToken::with_variant("89261234567", "79261234567");
        assert!(token.matches("the digits 79261234567 here"));
        assert!(token.matches("89261234567"));
        assert!(!token.matches("89991234567"));
    }

    #[test]
    fn digit_token_near_complete_threshold() {
        assert!(DigitToken::new("123456789").is_near_complete());
        assert!(!DigitToken::new("12345678").is_near_complete());
    }

    #[test]
    fn group_weights_are_ordered() {
        let weights: Vec<f64> = TextGroup::ALL.iter().map(|g| g.weight()).collect();
        assert_eq!(weights, vec![10.0, 5.0, 2.0, 1.0]);
    }

    #[test]
    fn empty_query_has_no_tokens() {
        assert!(!ParsedQuery::default().has_tokens());
    }
}
