// Service boundaries for discovery.
//
// PlanningService wraps the generative text provider; SearchService wraps the
// video search provider. VideoDiscovery only sees these traits, so tests run
// against MockPlanner / MockSearch with no network.

use async_trait::async_trait;

use ai_client::{AiError, OpenAi};
use studyhall_common::VideoCandidate;
use youtube_client::{Video, YouTubeClient};

use crate::error::DiscoveryError;

// ---------------------------------------------------------------------------
// PlanningService
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PlanningService: Send + Sync {
    /// Send one system + user prompt and return the raw completion text.
    /// Transport and provider failures are `DiscoveryError::UpstreamPlanning`.
    async fn complete(&self, system: &str, user: &str) -> Result<String, DiscoveryError>;
}

#[async_trait]
impl PlanningService for OpenAi {
    async fn complete(&self, system: &str, user: &str) -> Result<String, DiscoveryError> {
        match self.chat_completion(system, user).await {
            Ok(text) => Ok(text),
            // A reply with no text is malformed output, not an outage.
            Err(AiError::EmptyResponse) => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// SearchService
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SearchService: Send + Sync {
    /// Search for up to `max_results` videos, in provider ranking order.
    /// No matches is `Ok(vec![])`; provider failures are `SearchFailure`.
    async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<VideoCandidate>, DiscoveryError>;
}

#[async_trait]
impl SearchService for YouTubeClient {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<VideoCandidate>, DiscoveryError> {
        let videos = self.search_videos(query, max_results).await?;
        Ok(videos.into_iter().map(into_candidate).collect())
    }
}

fn into_candidate(video: Video) -> VideoCandidate {
    VideoCandidate {
        video_id: video.id,
        title: video.title,
        channel: video.channel_title,
        view_count: video.view_count,
        like_count: video.like_count,
        published_at: video.published_at,
        duration_code: video.duration,
    }
}
