// Test mocks for discovery.
//
// Two mocks matching the two trait boundaries:
// - MockPlanner (PlanningService): canned reply or canned upstream failure
// - MockSearch (SearchService): HashMap-based query→candidates, with
//   per-query failures and delays
//
// Plus helpers for building candidates against a fixed clock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use studyhall_common::VideoCandidate;

use crate::error::{DiscoveryError, UpstreamKind};
use crate::traits::{PlanningService, SearchService};

// ---------------------------------------------------------------------------
// Clock + candidate helpers
// ---------------------------------------------------------------------------

/// Fixed "now" used by tests that need stable scores.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// A candidate published `age_days` before `fixed_now()`.
pub fn candidate(id: &str, views: u64, likes: u64, age_days: i64) -> VideoCandidate {
    VideoCandidate {
        video_id: id.to_string(),
        title: format!("Video {id}"),
        channel: format!("Channel {id}"),
        view_count: views,
        like_count: likes,
        published_at: Some(fixed_now() - chrono::Duration::days(age_days)),
        duration_code: "PT10M".to_string(),
    }
}

// ---------------------------------------------------------------------------
// MockPlanner
// ---------------------------------------------------------------------------

enum PlannerReply {
    Text(String),
    Failure(UpstreamKind),
}

/// Planning service that always gives the same reply. Counts calls.
pub struct MockPlanner {
    reply: PlannerReply,
    calls: AtomicUsize,
}

impl MockPlanner {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: PlannerReply::Text(text.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(kind: UpstreamKind) -> Self {
        Self {
            reply: PlannerReply::Failure(kind),
            calls: AtomicUsize::new(0),
        }
    }

    /// Reply with a well-formed plan for the given (title, query) pairs.
    pub fn with_plan(main_query: &str, subtasks: &[(&str, &str)]) -> Self {
        let subtasks: Vec<serde_json::Value> = subtasks
            .iter()
            .map(|(title, query)| serde_json::json!({"title": title, "searchQuery": query}))
            .collect();
        let body = serde_json::json!({
            "subtasks": subtasks,
            "mainSearchQuery": main_query,
        });
        Self::replying(body.to_string())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlanningService for MockPlanner {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            PlannerReply::Text(text) => Ok(text.clone()),
            PlannerReply::Failure(kind) => Err(DiscoveryError::UpstreamPlanning {
                kind: *kind,
                message: format!("MockPlanner: {kind}"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MockSearch
// ---------------------------------------------------------------------------

/// HashMap-based search. Unregistered queries return no videos.
/// Builder pattern: `.on_query()`, `.failing()`, `.delayed()`.
pub struct MockSearch {
    results: HashMap<String, Vec<VideoCandidate>>,
    failures: HashMap<String, Option<u16>>,
    delays: HashMap<String, Duration>,
    queries: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self {
            results: HashMap::new(),
            failures: HashMap::new(),
            delays: HashMap::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn on_query(mut self, query: &str, candidates: Vec<VideoCandidate>) -> Self {
        self.results.insert(query.to_string(), candidates);
        self
    }

    pub fn failing(mut self, query: &str, status: Option<u16>) -> Self {
        self.failures.insert(query.to_string(), status);
        self
    }

    pub fn delayed(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    /// Queries received, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Default for MockSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchService for MockSearch {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<VideoCandidate>, DiscoveryError> {
        self.queries.lock().unwrap().push(query.to_string());

        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }

        if let Some(status) = self.failures.get(query) {
            return Err(DiscoveryError::SearchFailure {
                status: *status,
                message: format!("MockSearch: {query} failed"),
            });
        }

        Ok(self
            .results
            .get(query)
            .map(|c| c.iter().take(max_results as usize).cloned().collect())
            .unwrap_or_default())
    }
}
