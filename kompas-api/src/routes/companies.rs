use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    app_state::AppState,
    domain::search::{RebuildStats, SearchExplain, SearchHit},
    routes::ApiError,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search", get(search))
        .route("/search/filter", get(filter))
        .route("/search/explain", get(explain))
        .route("/:id/search-index", post(rebuild_one))
}

pub fn maintenance_router() -> Router<AppState> {
    Router::new().route("/rebuild", post(rebuild_all))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    q: String,
    limit: Option<usize>,
}

#[instrument(name = "GET /companies/search", skip(app_state))]
async fn search(
    State(app_state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    let hits = app_state.search.search(&params.q, params.limit).await?;
    Ok(Json(hits))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterParams {
    q: String,
    /// Comma-separated company ids of the base set to filter and order.
    ids: String,
}

/// Filter and reorder a base set of company ids by a query, the contract
/// the listing screens consume. An empty query echoes the base set back.
#[instrument(name = "GET /companies/search/filter", skip(app_state))]
async fn filter(
    State(app_state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Vec<i32>>, ApiError> {
    let base = parse_ids(&params.ids)?;
    let ids = app_state.search.apply(base, &params.q).await?;
    Ok(Json(ids))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplainParams {
    q: String,
    /// Comma-separated company ids of the result page.
    ids: String,
    max_reasons: Option<usize>,
}

#[instrument(name = "GET /companies/search/explain", skip(app_state))]
async fn explain(
    State(app_state): State<AppState>,
    Query(params): Query<ExplainParams>,
) -> Result<Json<HashMap<i32, SearchExplain>>, ApiError> {
    let ids = parse_ids(&params.ids)?;
    let explains = app_state
        .search
        .explain(&ids, &params.q, params.max_reasons)
        .await?;
    Ok(Json(explains))
}

#[instrument(name = "POST /companies/:id/search-index", skip(app_state))]
async fn rebuild_one(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    app_state.indexer.rebuild_company(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(name = "POST /search-index/rebuild", skip(app_state))]
async fn rebuild_all(
    State(app_state): State<AppState>,
) -> Result<Json<RebuildStats>, ApiError> {
    let stats = app_state.indexer.rebuild_all().await?;
    Ok(Json(stats))
}

fn parse_ids(raw: &str) -> Result<Vec<i32>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i32>()
                .map_err(|_| ApiError::bad_request(format!("invalid company id: {s}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_with_whitespace_and_trailing_commas() {
        assert_eq!(parse_ids("1, 2,3,").unwrap(), vec![1, 2, 3]);
        assert!(parse_ids("1,x").is_err());
        assert!(parse_ids("").unwrap().is_empty());
    }
}
