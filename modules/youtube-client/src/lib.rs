pub mod error;
pub mod types;

pub use error::{Result, YouTubeError};
pub use types::Video;

use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use types::{ApiErrorEnvelope, SearchListResponse, SearchParams, VideoDetailParams, VideoListResponse};

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// The search endpoint rejects `maxResults` above this.
const MAX_RESULTS_CAP: u32 = 50;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct YouTubeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Search for embeddable, non-short videos. Returns video ids in ranking order.
    pub async fn search_video_ids(&self, query: &str, max_results: u32) -> Result<Vec<String>> {
        let params = SearchParams::new(query, max_results.clamp(1, MAX_RESULTS_CAP), &self.api_key);
        let resp: SearchListResponse = self.get("search", &params).await?;
        Ok(resp.video_ids())
    }

    /// Batch lookup of snippet, statistics and duration for the given ids.
    pub async fn video_details(&self, ids: &[String]) -> Result<Vec<Video>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let params = VideoDetailParams::new(ids, &self.api_key);
        let resp: VideoListResponse = self.get("videos", &params).await?;
        Ok(resp.items.into_iter().map(|item| item.into_video()).collect())
    }

    /// Search end-to-end: ids from the search call, enriched by the detail call.
    /// Output follows search order. An empty search is not an error.
    pub async fn search_videos(&self, query: &str, max_results: u32) -> Result<Vec<Video>> {
        tracing::debug!(query, max_results, "Searching YouTube");

        let ids = self.search_video_ids(query, max_results).await?;
        if ids.is_empty() {
            tracing::info!(query, "YouTube search returned no videos");
            return Ok(Vec::new());
        }

        let details = self.video_details(&ids).await?;
        let videos = order_by_ids(&ids, details);
        tracing::debug!(query, count = videos.len(), "Fetched video details");

        Ok(videos)
    }

    async fn get<P: Serialize, T: DeserializeOwned>(&self, endpoint: &str, params: &P) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let resp = self.client.get(&url).query(params).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|env| env.error.message)
                .unwrap_or(body);
            return Err(YouTubeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Reorder detail results to match the search ranking. Ids the detail call
/// did not return (deleted or private videos) are dropped.
pub fn order_by_ids(ids: &[String], videos: Vec<Video>) -> Vec<Video> {
    let mut by_id: HashMap<String, Video> =
        videos.into_iter().map(|v| (v.id.clone(), v)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}
