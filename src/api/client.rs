//! Typed JSON client for the match API

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use super::types::*;

/// Thin reqwest wrapper around the match service.
///
/// One client, one base URL; every call maps failures into [`ApiError`].
/// Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(ApiError::Request)?;
        Self::parse(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .post(self.url(path))
            .query(query)
            .json(body)
            .send()
            .await
            .map_err(ApiError::Request)?;
        Self::parse(response).await
    }

    /// POST where only the status matters; the body (usually `{}`) is dropped
    async fn post_unit<B: Serialize>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(path))
            .query(query)
            .json(body)
            .send()
            .await
            .map_err(ApiError::Request)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, %body, path, "match API error");
            return Err(ApiError::Api { status, body });
        }
        Ok(())
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, %body, "match API error");
            return Err(ApiError::Api { status, body });
        }
        response.json().await.map_err(ApiError::Parse)
    }

    pub async fn create_match(
        &self,
        req: &CreateMatchRequest,
    ) -> Result<CreateMatchResponse, ApiError> {
        self.post_json("/api/match/create", &[], req).await
    }

    pub async fn join_match(&self, req: &JoinMatchRequest) -> Result<(), ApiError> {
        self.post_unit("/api/match/join", &[], req).await
    }

    pub async fn start_match(&self, code: &str) -> Result<(), ApiError> {
        self.post_unit(
            "/api/match/start",
            &[("code", code.to_string())],
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn lobby(&self, code: &str) -> Result<LobbyResponse, ApiError> {
        self.get_json("/api/match/lobby", &[("code", code.to_string())])
            .await
    }

    pub async fn round(&self, code: &str, round_no: u32) -> Result<RoundResponse, ApiError> {
        self.get_json(
            "/api/match/round",
            &[
                ("code", code.to_string()),
                ("round_no", round_no.to_string()),
            ],
        )
        .await
    }

    pub async fn guess(&self, round_no: u32, req: &GuessRequest) -> Result<GuessResponse, ApiError> {
        self.post_json(
            "/api/match/guess",
            &[("round_no", round_no.to_string())],
            req,
        )
        .await
    }

    pub async fn round_result(
        &self,
        code: &str,
        round_no: u32,
    ) -> Result<RoundResultResponse, ApiError> {
        self.get_json(
            "/api/match/round_result",
            &[
                ("code", code.to_string()),
                ("round_no", round_no.to_string()),
            ],
        )
        .await
    }

    pub async fn final_standings(&self, code: &str) -> Result<FinalResponse, ApiError> {
        self.get_json("/api/match/final", &[("code", code.to_string())])
            .await
    }

    pub async fn cities(&self) -> Result<CitiesResponse, ApiError> {
        self.get_json("/api/cities", &[]).await
    }

    pub async fn top_scores(
        &self,
        city: Option<&str>,
        limit: u32,
        order: &str,
    ) -> Result<TopScoresResponse, ApiError> {
        let mut query = vec![
            ("limit", limit.to_string()),
            ("order", order.to_string()),
        ];
        if let Some(city) = city {
            query.push(("city", city.to_string()));
        }
        self.get_json("/api/leaderboard", &query).await
    }
}

/// Match API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),
}
