use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Normalized output ---

/// A video with its statistics, normalized from the `videos` endpoint.
/// Counts the API omits (hidden likes, fresh uploads) are reported as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub channel_title: String,
    pub view_count: u64,
    pub like_count: u64,
    pub published_at: Option<DateTime<Utc>>,
    /// ISO 8601 duration as returned by the API, e.g. `PT12M30S`.
    pub duration: String,
}

// --- search.list ---

/// Query parameters for `GET /search`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams<'a> {
    pub part: &'static str,
    #[serde(rename = "type")]
    pub result_type: &'static str,
    pub q: &'a str,
    pub max_results: u32,
    /// `medium` restricts results to 4–20 minute videos, dropping shorts.
    pub video_duration: &'static str,
    pub video_embeddable: &'static str,
    pub key: &'a str,
}

impl<'a> SearchParams<'a> {
    pub fn new(query: &'a str, max_results: u32, key: &'a str) -> Self {
        Self {
            part: "snippet",
            result_type: "video",
            q: query,
            max_results,
            video_duration: "medium",
            video_embeddable: "true",
            key,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

impl SearchListResponse {
    /// Video identifiers in result order, skipping channel/playlist hits.
    pub fn video_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| item.id.video_id.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub id: SearchItemId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItemId {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

// --- videos.list ---

#[derive(Debug, Clone, Serialize)]
pub struct VideoDetailParams<'a> {
    pub part: &'static str,
    pub id: String,
    pub key: &'a str,
}

impl<'a> VideoDetailParams<'a> {
    pub fn new(ids: &[String], key: &'a str) -> Self {
        Self {
            part: "snippet,statistics,contentDetails",
            id: ids.join(","),
            key,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    pub snippet: Option<VideoSnippet>,
    pub statistics: Option<VideoStatistics>,
    pub content_details: Option<ContentDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub channel_title: String,
    pub published_at: Option<String>,
}

/// Counts come back as decimal strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentDetails {
    #[serde(default)]
    pub duration: String,
}

impl VideoItem {
    /// Convert to a normalized `Video`.
    pub fn into_video(self) -> Video {
        let (title, channel_title, published_at) = match self.snippet {
            Some(s) => (s.title, s.channel_title, s.published_at),
            None => (String::new(), String::new(), None),
        };
        let (view_count, like_count) = match self.statistics {
            Some(s) => (parse_count(s.view_count), parse_count(s.like_count)),
            None => (0, 0),
        };

        Video {
            id: self.id,
            title,
            channel_title,
            view_count,
            like_count,
            published_at: published_at.as_deref().and_then(parse_timestamp),
            duration: self.content_details.map(|c| c.duration).unwrap_or_default(),
        }
    }
}

fn parse_count(raw: Option<String>) -> u64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// --- Errors ---

/// Error envelope the API returns on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}
