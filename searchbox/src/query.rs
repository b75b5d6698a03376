use serde::{Deserialize, Serialize};

/// A search request against one index.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub q: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes_to_highlight: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_pre_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_post_tag: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub show_ranking_score: bool,
}

impl SearchQuery {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_ranking_score(mut self) -> Self {
        self.show_ranking_score = true;
        self
    }

    pub fn with_highlight(
        mut self,
        attributes: Vec<String>,
        pre_tag: impl Into<String>,
        post_tag: impl Into<String>,
    ) -> Self {
        self.attributes_to_highlight = Some(attributes);
        self.highlight_pre_tag = Some(pre_tag.into());
        self.highlight_post_tag = Some(post_tag.into());
        self
    }
}

/// One hit as returned by the service. The document fields are flattened
/// into `document`; `_formatted` carries highlighted copies when requested.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit<T> {
    #[serde(flatten)]
    pub document: T,
    #[serde(rename = "_formatted")]
    pub formatted: Option<T>,
    #[serde(rename = "_rankingScore")]
    pub ranking_score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults<T> {
    pub hits: Vec<SearchHit<T>>,
    #[serde(default)]
    pub estimated_total_hits: Option<u64>,
    #[serde(default)]
    pub processing_time_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_serializes_camel_case_and_skips_defaults() {
        let query = SearchQuery::new("ромашка 7701").with_limit(50).with_ranking_score();
        let json = serde_json::to_value(&query).unwrap();

        assert_eq!(json["q"], "ромашка 7701");
        assert_eq!(json["limit"], 50);
        assert_eq!(json["showRankingScore"], true);
        assert!(json.get("attributesToHighlight").is_none());
        assert!(json.get("filter").is_none());
    }

    #[test]
    fn results_deserialize_with_ranking_score() {
        #[derive(Debug, Deserialize)]
        struct Doc {
            id: i32,
        }

        let body = serde_json::json!({
            "hits": [{"id": 7, "_rankingScore": 0.83}],
            "estimatedTotalHits": 1,
            "processingTimeMs": 2,
        });

        let results: SearchResults<Doc> = serde_json::from_value(body).unwrap();
        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.hits[0].document.id, 7);
        assert_eq!(results.hits[0].ranking_score, Some(0.83));
        assert_eq!(results.estimated_total_hits, Some(1));
    }
}
