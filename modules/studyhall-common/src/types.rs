use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Planning ---

/// One sub-topic of a learning plan, with the query used to find videos for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub title: String,
    pub search_query: String,
    pub description: Option<String>,
}

impl Subtask {
    pub fn new(title: impl Into<String>, search_query: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            search_query: search_query.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Planner-supplied description, or one derived from the title.
    pub fn description_or_default(&self) -> String {
        match self.description.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => format!("Learn about {}", self.title),
        }
    }
}

/// A decomposed topic: ordered sub-topics plus the query for the primary video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerOutput {
    pub subtasks: Vec<Subtask>,
    pub main_search_query: String,
}

// --- Search ---

/// A video returned by the search provider, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCandidate {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub view_count: u64,
    pub like_count: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub duration_code: String,
}

// --- Result ---

/// A scored video with the reason it was recommended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedVideo {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub views: u64,
    pub engagement_score: u32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskResult {
    pub title: String,
    pub description: String,
    pub videos: Vec<RankedVideo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryVideo {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub reason: String,
}

/// The full answer for one topic. Serializes with the primary video's
/// fields at the top level next to `subtasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResult {
    #[serde(flatten)]
    pub primary_video: PrimaryVideo,
    pub subtasks: Vec<SubtaskResult>,
}
