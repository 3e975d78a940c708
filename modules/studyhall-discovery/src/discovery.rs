//! Result assembly: plan a topic, find the primary video, then search every
//! sub-topic concurrently and merge the results back in plan order.

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use ai_client::OpenAi;
use studyhall_common::{Config, DiscoveryResult, PrimaryVideo, Subtask, SubtaskResult};
use youtube_client::YouTubeClient;

use crate::error::DiscoveryError;
use crate::planner::{TopicPlanner, MAX_SUBTASKS};
use crate::scoring::{rank, ScoredVideo};
use crate::traits::{PlanningService, SearchService};

/// `maxResults` for every search call.
pub const RESULTS_PER_SEARCH: u32 = 5;
/// Videos kept per sub-topic after ranking.
pub const VIDEOS_PER_SUBTASK: usize = 5;
/// Sub-topic searches in flight at once.
pub const MAX_CONCURRENT_SEARCHES: usize = 5;

/// Trim and check a caller-supplied topic.
pub fn validate_topic(raw: &str) -> Result<&str, DiscoveryError> {
    let topic = raw.trim();
    if topic.is_empty() {
        return Err(DiscoveryError::InvalidTopic("topic is required".into()));
    }
    Ok(topic)
}

pub struct VideoDiscovery {
    planner: TopicPlanner,
    search: Arc<dyn SearchService>,
}

impl VideoDiscovery {
    pub fn new(planning: Arc<dyn PlanningService>, search: Arc<dyn SearchService>) -> Self {
        Self {
            planner: TopicPlanner::new(planning),
            search,
        }
    }

    /// Wire up the production planning and search clients.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let planning = OpenAi::new(&config.ai_api_key, &config.planner_model)
            .context("Failed to build planning client")?
            .with_base_url(&config.ai_base_url);
        let search = YouTubeClient::new(config.youtube_api_key.clone())
            .context("Failed to build YouTube client")?
            .with_base_url(&config.youtube_base_url);
        Ok(Self::new(Arc::new(planning), Arc::new(search)))
    }

    pub async fn discover(&self, topic: &str) -> Result<DiscoveryResult, DiscoveryError> {
        self.discover_at(topic, Utc::now()).await
    }

    /// Run discovery scoring against a fixed clock.
    pub async fn discover_at(
        &self,
        topic: &str,
        now: DateTime<Utc>,
    ) -> Result<DiscoveryResult, DiscoveryError> {
        let topic = validate_topic(topic)?;
        info!(topic, "Discovery starting");

        let plan = self.planner.plan(topic).await?;
        let primary_video = self.primary_video(&plan.main_search_query, now).await?;
        let subtasks = self.search_subtasks(&plan.subtasks, now).await;

        let total: usize = subtasks.iter().map(|s| s.videos.len()).sum();
        info!(
            topic,
            primary = %primary_video.video_id,
            subtasks = subtasks.len(),
            videos = total,
            "Discovery complete"
        );

        Ok(DiscoveryResult {
            primary_video,
            subtasks,
        })
    }

    async fn primary_video(
        &self,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<PrimaryVideo, DiscoveryError> {
        let candidates = match self.search.search(query, RESULTS_PER_SEARCH).await {
            Ok(c) => c,
            Err(e @ DiscoveryError::SearchFailure { .. }) => {
                return Err(DiscoveryError::NoPrimaryVideoFound(e.to_string()));
            }
            Err(e) => return Err(e),
        };

        rank(candidates, now)
            .into_iter()
            .next()
            .map(ScoredVideo::into_primary)
            .ok_or_else(|| {
                DiscoveryError::NoPrimaryVideoFound(format!("no videos matched \"{query}\""))
            })
    }

    /// Search each sub-topic concurrently. A failed search leaves that
    /// sub-topic with no videos; results are placed by plan index.
    async fn search_subtasks(
        &self,
        subtasks: &[Subtask],
        now: DateTime<Utc>,
    ) -> Vec<SubtaskResult> {
        let subtasks = &subtasks[..subtasks.len().min(MAX_SUBTASKS)];

        // Branches own their inputs; a borrowed &Subtask makes discover() !Send.
        let branches: Vec<_> = subtasks
            .iter()
            .enumerate()
            .map(|(index, subtask)| {
                let search = Arc::clone(&self.search);
                let title = subtask.title.clone();
                let query = subtask.search_query.clone();
                async move {
                    let videos = match search.search(&query, RESULTS_PER_SEARCH).await {
                        Ok(candidates) => {
                            let mut ranked = rank(candidates, now);
                            ranked.truncate(VIDEOS_PER_SUBTASK);
                            ranked
                        }
                        Err(e) => {
                            warn!(
                                subtask = title.as_str(),
                                query = query.as_str(),
                                error = %e,
                                "Subtask search failed, continuing without videos"
                            );
                            Vec::new()
                        }
                    };
                    (index, videos)
                }
            })
            .collect();

        let results: Vec<(usize, Vec<ScoredVideo>)> = stream::iter(branches)
            .buffer_unordered(MAX_CONCURRENT_SEARCHES)
            .collect()
            .await;

        let mut slots: Vec<Vec<ScoredVideo>> = (0..subtasks.len()).map(|_| Vec::new()).collect();
        for (index, videos) in results {
            slots[index] = videos;
        }

        subtasks
            .iter()
            .zip(slots)
            .map(|(subtask, videos)| SubtaskResult {
                title: subtask.title.clone(),
                description: subtask.description_or_default(),
                videos: videos
                    .into_iter()
                    .enumerate()
                    .map(|(rank, video)| video.into_ranked(subtask_reason(rank)))
                    .collect(),
            })
            .collect()
    }
}

fn subtask_reason(rank: usize) -> String {
    if rank == 0 {
        "Highest engagement for this topic".to_string()
    } else {
        format!("Recommended video #{}", rank + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamKind;
    use crate::planner::fallback_plan;
    use crate::testing::{candidate, fixed_now, MockPlanner, MockSearch};
    use std::time::Duration;

    fn discovery(planner: MockPlanner, search: MockSearch) -> VideoDiscovery {
        VideoDiscovery::new(Arc::new(planner), Arc::new(search))
    }

    #[test]
    fn validate_topic_trims_and_rejects_blank() {
        assert_eq!(validate_topic("  Photosynthesis \n").unwrap(), "Photosynthesis");
        assert!(matches!(validate_topic("   "), Err(DiscoveryError::InvalidTopic(_))));
        assert!(matches!(validate_topic(""), Err(DiscoveryError::InvalidTopic(_))));
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn discover_future_is_send() {
        let d = discovery(MockPlanner::replying(""), MockSearch::new());
        let fut = d.discover("Rust");
        assert_send(&fut);
        let fut = d.discover_at("Rust", fixed_now());
        assert_send(&fut);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn discover_runs_on_spawned_task() {
        let search = MockSearch::new()
            .on_query("Rust tutorial explained", vec![candidate("m", 50_000, 900, 20)])
            .on_query("Rust practice problems", vec![candidate("p", 2_000, 40, 5)]);
        let d = Arc::new(discovery(MockPlanner::replying(""), search));

        let handle = tokio::spawn({
            let d = Arc::clone(&d);
            async move { d.discover_at("Rust", fixed_now()).await }
        });
        let result = handle.await.unwrap().unwrap();

        assert_eq!(result.primary_video.video_id, "m");
        assert_eq!(result.subtasks.len(), 3);
        assert_eq!(result.subtasks[2].videos[0].video_id, "p");
    }

    #[tokio::test]
    async fn long_topic_is_planned_like_any_other() {
        let topic = "a".repeat(201);
        let search = MockSearch::new().on_query(
            &format!("{topic} tutorial explained"),
            vec![candidate("main", 10_000, 100, 3)],
        );
        let d = discovery(MockPlanner::replying("no plan"), search);

        let result = d.discover_at(&topic, fixed_now()).await.unwrap();
        assert_eq!(result.primary_video.video_id, "main");
        assert_eq!(result.subtasks.len(), 3);
    }

    #[test]
    fn subtask_reasons_are_one_indexed() {
        assert_eq!(subtask_reason(0), "Highest engagement for this topic");
        assert_eq!(subtask_reason(1), "Recommended video #2");
        assert_eq!(subtask_reason(4), "Recommended video #5");
    }

    #[tokio::test]
    async fn blank_topic_never_reaches_planner() {
        let planner = Arc::new(MockPlanner::replying("{}"));
        let d = VideoDiscovery::new(planner.clone(), Arc::new(MockSearch::new()));
        let err = d.discover("  ").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidTopic(_)));
        assert_eq!(planner.calls(), 0);
    }

    #[tokio::test]
    async fn primary_is_highest_scoring_main_candidate() {
        let search = MockSearch::new().on_query(
            "Rust tutorial explained",
            vec![
                candidate("a", 5_000, 50, 100),
                candidate("b", 900_000, 20_000, 10),
                candidate("c", 300_000, 4_000, 30),
            ],
        );
        let d = discovery(MockPlanner::replying("nope"), search);
        let result = d.discover_at("Rust", fixed_now()).await.unwrap();
        assert_eq!(result.primary_video.video_id, "b");
        assert!(result.primary_video.reason.contains("900,000 views"));
    }

    #[tokio::test]
    async fn main_search_failure_is_no_primary_video() {
        let search = MockSearch::new().failing("Rust tutorial explained", Some(403));
        let d = discovery(MockPlanner::replying("nope"), search);
        let err = d.discover_at("Rust", fixed_now()).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::NoPrimaryVideoFound(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn empty_main_search_is_no_primary_video() {
        let d = discovery(MockPlanner::replying("nope"), MockSearch::new());
        let err = d.discover_at("Rust", fixed_now()).await.unwrap_err();
        match err {
            DiscoveryError::NoPrimaryVideoFound(msg) => {
                assert!(msg.contains("Rust tutorial explained"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn upstream_planning_error_skips_search() {
        let search = Arc::new(MockSearch::new());
        let d = VideoDiscovery::new(
            Arc::new(MockPlanner::failing(UpstreamKind::QuotaExceeded)),
            search.clone(),
        );
        let err = d.discover_at("Rust", fixed_now()).await.unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::UpstreamPlanning { kind: UpstreamKind::QuotaExceeded, .. }
        ));
        assert!(search.queries().is_empty());
    }

    #[tokio::test]
    async fn subtask_failure_only_empties_that_subtask() {
        let plan = fallback_plan("Rust");
        let search = MockSearch::new()
            .on_query(&plan.main_search_query, vec![candidate("main", 10_000, 100, 5)])
            .on_query(&plan.subtasks[0].search_query, vec![candidate("s0", 1_000, 10, 5)])
            .failing(&plan.subtasks[1].search_query, Some(500))
            .on_query(&plan.subtasks[2].search_query, vec![candidate("s2", 2_000, 20, 5)]);

        let result = discovery(MockPlanner::replying("nope"), search)
            .discover_at("Rust", fixed_now())
            .await
            .unwrap();

        assert_eq!(result.subtasks.len(), 3);
        assert_eq!(result.subtasks[0].videos[0].video_id, "s0");
        assert!(result.subtasks[1].videos.is_empty());
        assert_eq!(result.subtasks[2].videos[0].video_id, "s2");
    }

    #[tokio::test]
    async fn subtasks_merge_in_plan_order_not_completion_order() {
        let planner = MockPlanner::with_plan(
            "main",
            &[("Slow", "slow"), ("Medium", "medium"), ("Fast", "fast")],
        );
        let search = MockSearch::new()
            .on_query("main", vec![candidate("m", 1_000, 1, 1)])
            .on_query("slow", vec![candidate("slow-1", 1_000, 1, 1)])
            .on_query("medium", vec![candidate("medium-1", 1_000, 1, 1)])
            .on_query("fast", vec![candidate("fast-1", 1_000, 1, 1)])
            .delayed("slow", Duration::from_millis(80))
            .delayed("medium", Duration::from_millis(40));

        let result = discovery(planner, search)
            .discover_at("Anything", fixed_now())
            .await
            .unwrap();

        let titles: Vec<_> = result.subtasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Slow", "Medium", "Fast"]);
        let first_ids: Vec<_> = result
            .subtasks
            .iter()
            .map(|s| s.videos[0].video_id.as_str())
            .collect();
        assert_eq!(first_ids, vec!["slow-1", "medium-1", "fast-1"]);
    }

    #[tokio::test]
    async fn subtask_videos_are_ranked_and_tagged() {
        let planner = MockPlanner::with_plan("main", &[("Only", "only")]);
        let search = MockSearch::new()
            .on_query("main", vec![candidate("m", 1_000, 1, 1)])
            .on_query(
                "only",
                vec![
                    candidate("low", 2_000, 5, 200),
                    candidate("top", 800_000, 30_000, 3),
                    candidate("mid", 150_000, 3_000, 20),
                ],
            );

        let result = discovery(planner, search)
            .discover_at("Anything", fixed_now())
            .await
            .unwrap();

        let videos = &result.subtasks[0].videos;
        let ids: Vec<_> = videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["top", "mid", "low"]);
        assert_eq!(videos[0].reason, "Highest engagement for this topic");
        assert_eq!(videos[1].reason, "Recommended video #2");
        assert_eq!(videos[2].reason, "Recommended video #3");
        assert_eq!(result.subtasks[0].description, "Learn about Only");
    }

    #[tokio::test]
    async fn fan_out_searches_every_subtask_once() {
        let planner = MockPlanner::with_plan(
            "main",
            &[("A", "qa"), ("B", "qb"), ("C", "qc"), ("D", "qd"), ("E", "qe")],
        );
        let search = Arc::new(MockSearch::new().on_query("main", vec![candidate("m", 1, 1, 1)]));
        let d = VideoDiscovery::new(Arc::new(planner), search.clone());
        let result = d.discover_at("Letters", fixed_now()).await.unwrap();

        assert_eq!(result.subtasks.len(), 5);
        let mut queries = search.queries();
        assert_eq!(queries.remove(0), "main");
        queries.sort();
        assert_eq!(queries, vec!["qa", "qb", "qc", "qd", "qe"]);
    }
}
