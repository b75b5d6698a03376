use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Index settings, applied with `PATCH /indexes/{uid}/settings`.
///
/// Only the fields that are set are sent, so partial updates leave the
/// remaining settings untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSettings {
    /// Attributes considered during search, in decreasing order of weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searchable_attributes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filterable_attributes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sortable_attributes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking_rules: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_words: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<BTreeMap<String, Vec<String>>>,
}

impl IndexSettings {
    pub fn searchable(mut self, attributes: Vec<String>) -> Self {
        self.searchable_attributes = Some(attributes);
        self
    }

    pub fn filterable(mut self, attributes: Vec<String>) -> Self {
        self.filterable_attributes = Some(attributes);
        self
    }

    pub fn sortable(mut self, attributes: Vec<String>) -> Self {
        self.sortable_attributes = Some(attributes);
        self
    }

    pub fn ranking_rules(mut self, rules: Vec<String>) -> Self {
        self.ranking_rules = Some(rules);
        self
    }

    pub fn stop_words(mut self, words: Vec<String>) -> Self {
        self.stop_words = Some(words);
        self
    }

    pub fn synonyms(mut self, synonyms: BTreeMap<String, Vec<String>>) -> Self {
        self.synonyms = Some(synonyms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_serialize_only_set_fields() {
        let settings = IndexSettings::default()
            .searchable(vec!["names".into(), "other".into()])
            .stop_words(vec!["ооо".into()]);

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["searchableAttributes"][0], "names");
        assert_eq!(json["stopWords"][0], "ооо");
        assert!(json.get("synonyms").is_none());
        assert!(json.get("rankingRules").is_none());
    }
}
