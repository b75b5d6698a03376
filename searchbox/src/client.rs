use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{IndexSettings, SearchQuery, SearchResults};

/// Client for a Searchbox (Meilisearch-compatible) server.
///
/// All requests carry a short timeout; transport errors and timeouts are
/// normalized to [`SearchboxError::Unavailable`] so callers can treat them
/// uniformly as "service down".
#[derive(Debug, Clone)]
pub struct SearchboxClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SearchboxClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SearchboxError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchboxError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, SearchboxError> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| SearchboxError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SearchboxError::Unauthorized);
        }

        Ok(resp)
    }

    async fn expect_success(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, SearchboxError> {
        let resp = self.send(req).await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchboxError::ResponseError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, SearchboxError> {
        let resp = self.expect_success(req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| SearchboxError::ParsingError(e.to_string()))
    }

    /// Liveness probe. `Ok` means the service answered and reported itself
    /// available.
    pub async fn health(&self) -> Result<(), SearchboxError> {
        let resp: HealthResponse = self.fetch(self.http.get(self.endpoint("health"))).await?;
        if resp.status == "available" {
            Ok(())
        } else {
            Err(SearchboxError::Unavailable(resp.status))
        }
    }

    /// Create the index if it does not exist yet. An already-existing index
    /// is not an error, so the call is safe to repeat on every startup.
    pub async fn ensure_index(&self, uid: &str, primary_key: &str) -> Result<(), SearchboxError> {
        let body = CreateIndexRequest {
            uid,
            primary_key,
        };
        let resp = self
            .send(self.http.post(self.endpoint("indexes")).json(&body))
            .await?;

        let status = resp.status();
        if status.is_success() || status == reqwest::StatusCode::CONFLICT {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(SearchboxError::ResponseError {
            status: status.as_u16(),
            body,
        })
    }

    pub async fn update_settings(
        &self,
        uid: &str,
        settings: &IndexSettings,
    ) -> Result<(), SearchboxError> {
        let path = format!("indexes/{uid}/settings");
        self.expect_success(self.http.patch(self.endpoint(&path)).json(settings))
            .await?;
        Ok(())
    }

    pub async fn search<T: DeserializeOwned>(
        &self,
        uid: &str,
        query: &SearchQuery,
    ) -> Result<SearchResults<T>, SearchboxError> {
        let path = format!("indexes/{uid}/search");
        self.fetch(self.http.post(self.endpoint(&path)).json(query))
            .await
    }

    /// Add or replace documents. Documents with a known primary key value
    /// overwrite the previous version.
    pub async fn add_documents<T: Serialize>(
        &self,
        uid: &str,
        documents: &[T],
    ) -> Result<(), SearchboxError> {
        let path = format!("indexes/{uid}/documents");
        self.expect_success(self.http.post(self.endpoint(&path)).json(documents))
            .await?;
        Ok(())
    }

    pub async fn delete_document(
        &self,
        uid: &str,
        document_id: impl std::fmt::Display,
    ) -> Result<(), SearchboxError> {
        let path = format!("indexes/{uid}/documents/{document_id}");
        self.expect_success(self.http.delete(self.endpoint(&path)))
            .await?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SearchboxError {
    /// The service could not be reached, timed out, or reported itself down.
    #[error("searchbox unavailable: {0}")]
    Unavailable(String),
    #[error("searchbox rejected the API key")]
    Unauthorized,
    #[error("unexpected searchbox response ({status}): {body}")]
    ResponseError { status: u16, body: String },
    #[error("failed to parse searchbox response: {0}")]
    ParsingError(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateIndexRequest<'a> {
    uid: &'a str,
    primary_key: &'a str,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}
