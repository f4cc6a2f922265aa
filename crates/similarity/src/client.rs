//! HTTP implementation of [`SimilarityService`].
//!
//! Wire contract:
//!
//! | Call | Method | Path |
//! |------|--------|------|
//! | instant | `POST` | `/match/process-item` |
//! | background | `POST` | `/match/background` |
//! | health | `GET` | `/health/ping` |
//!
//! Item IDs travel as strings; match labels are normalised with
//! [`normalize_match_type`].

use std::time::Duration;

use async_trait::async_trait;
use lostfound_core::types::DbId;
use serde::{Deserialize, Serialize};

use crate::error::SimilarityError;
use crate::service::SimilarityService;
use crate::types::{normalize_match_type, BackgroundMatch, InstantMatch, ItemFeatures};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default number of counterparts requested per instant call.
pub const DEFAULT_MAX_RESULTS: u32 = 10;

#[derive(Debug, Clone)]
pub struct SimilarityClientConfig {
    /// Base URL without trailing slash, e.g. `http://localhost:8000`.
    pub base_url: String,
    pub timeout: Duration,
    /// Minimum similarity for instant-match results.
    pub instant_threshold: f64,
    pub max_results: u32,
}

impl SimilarityClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            instant_threshold: lostfound_core::matching::DEFAULT_BACKGROUND_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ProcessItemRequest<'a> {
    item_id: String,
    item_name: &'a str,
    description: &'a str,
    category: &'a str,
    image_url: Option<&'a str>,
    collection: &'a str,
    threshold: f64,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct ProcessItemResponse {
    #[serde(default)]
    matches: Vec<WireInstantMatch>,
}

#[derive(Debug, Deserialize)]
struct WireInstantMatch {
    item_id: String,
    similarity_score: f64,
    #[serde(default)]
    match_type: String,
}

#[derive(Debug, Serialize)]
struct BackgroundRequest {
    limit: i64,
    threshold: f64,
}

#[derive(Debug, Deserialize)]
struct BackgroundResponse {
    #[serde(default)]
    matches: Vec<WireBackgroundMatch>,
}

#[derive(Debug, Deserialize)]
struct WireBackgroundMatch {
    lost_item_id: String,
    found_item_id: String,
    similarity_score: f64,
    #[serde(default)]
    match_type: String,
}

fn parse_id(raw: &str) -> Result<DbId, SimilarityError> {
    raw.trim()
        .parse::<DbId>()
        .map_err(|_| SimilarityError::Decode(format!("Invalid item id '{raw}'")))
}

impl TryFrom<WireInstantMatch> for InstantMatch {
    type Error = SimilarityError;

    fn try_from(wire: WireInstantMatch) -> Result<Self, Self::Error> {
        Ok(InstantMatch {
            paired_item_id: parse_id(&wire.item_id)?,
            similarity: wire.similarity_score,
            match_type: normalize_match_type(&wire.match_type),
        })
    }
}

impl TryFrom<WireBackgroundMatch> for BackgroundMatch {
    type Error = SimilarityError;

    fn try_from(wire: WireBackgroundMatch) -> Result<Self, Self::Error> {
        Ok(BackgroundMatch {
            lost_item_id: parse_id(&wire.lost_item_id)?,
            found_item_id: parse_id(&wire.found_item_id)?,
            similarity: wire.similarity_score,
            match_type: normalize_match_type(&wire.match_type),
        })
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// reqwest-backed similarity client.
pub struct HttpSimilarityClient {
    client: reqwest::Client,
    config: SimilarityClientConfig,
}

impl HttpSimilarityClient {
    pub fn new(config: SimilarityClientConfig) -> Result<Self, SimilarityError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, SimilarityError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SimilarityError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<R>()
            .await
            .map_err(|e| SimilarityError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SimilarityService for HttpSimilarityClient {
    async fn match_instant(
        &self,
        features: &ItemFeatures,
    ) -> Result<Vec<InstantMatch>, SimilarityError> {
        let request = ProcessItemRequest {
            item_id: features.item_id.to_string(),
            item_name: &features.name,
            description: &features.description,
            category: &features.category,
            image_url: features.image_url.as_deref(),
            collection: features.kind.collection(),
            threshold: self.config.instant_threshold,
            max_results: self.config.max_results,
        };
        let response: ProcessItemResponse =
            self.post_json("/match/process-item", &request).await?;
        tracing::debug!(
            item_id = features.item_id,
            matches = response.matches.len(),
            "Instant match response"
        );
        response.matches.into_iter().map(InstantMatch::try_from).collect()
    }

    async fn match_background(
        &self,
        limit: i64,
        threshold: f64,
    ) -> Result<Vec<BackgroundMatch>, SimilarityError> {
        let response: BackgroundResponse = self
            .post_json("/match/background", &BackgroundRequest { limit, threshold })
            .await?;
        response
            .matches
            .into_iter()
            .map(BackgroundMatch::try_from)
            .collect()
    }

    async fn health(&self) -> bool {
        match self.client.get(self.url("/health/ping")).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(status = response.status().as_u16(), "Similarity service unhealthy");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Similarity service unreachable");
                false
            }
        }
    }
}
