//! Topic planning: turn a topic into ordered sub-topics plus one main query.
//!
//! The planning service's reply is untrusted text. After stripping a code
//! fence it must parse into `PlanResponse` exactly; anything else falls back
//! to a fixed three-step plan built from the topic.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use studyhall_common::{PlannerOutput, Subtask};

use crate::error::DiscoveryError;
use crate::traits::PlanningService;

/// Upper bound on sub-topics kept from a plan.
pub const MAX_SUBTASKS: usize = 5;

// =============================================================================
// Response schema
// =============================================================================

/// The JSON shape the planning service is asked to produce.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    /// Three to five sub-topics, in the order a learner should study them.
    subtasks: Vec<PlanSubtask>,
    /// YouTube search query for one overview video of the whole topic.
    main_search_query: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct PlanSubtask {
    /// Short title of the sub-topic.
    title: String,
    /// YouTube search query for this sub-topic.
    search_query: String,
    /// One sentence on what the learner gets from this step.
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error("response is not a valid plan: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plan has no subtasks")]
    NoSubtasks,

    #[error("subtask {0} has a blank title or search query")]
    BlankSubtask(usize),

    #[error("mainSearchQuery is blank")]
    BlankMainQuery,
}

// =============================================================================
// TopicPlanner
// =============================================================================

pub struct TopicPlanner {
    service: Arc<dyn PlanningService>,
    system_prompt: String,
}

impl TopicPlanner {
    pub fn new(service: Arc<dyn PlanningService>) -> Self {
        Self {
            service,
            system_prompt: system_prompt(),
        }
    }

    /// Plan `topic`. Malformed replies fall back to `fallback_plan`; only a
    /// failed call to the planning service is an error.
    pub async fn plan(&self, topic: &str) -> Result<PlannerOutput, DiscoveryError> {
        let raw = self
            .service
            .complete(&self.system_prompt, &user_prompt(topic))
            .await?;

        match parse_plan(&raw) {
            Ok(plan) => {
                info!(topic, subtasks = plan.subtasks.len(), "Topic planned");
                Ok(plan)
            }
            Err(e) => {
                warn!(topic, error = %e, "Planner reply rejected, using fallback plan");
                Ok(fallback_plan(topic))
            }
        }
    }
}

fn system_prompt() -> String {
    let schema = serde_json::to_string_pretty(&schemars::schema_for!(PlanResponse))
        .unwrap_or_default();
    format!(
        "You are a curriculum designer. Break a learning topic into 3 to 5 \
         sub-topics, ordered from foundations to practice, and write a YouTube \
         search query for each. Also write one search query for a single \
         overview video of the whole topic.\n\n\
         Reply with JSON only, no prose and no markdown, matching this schema:\n{schema}"
    )
}

fn user_prompt(topic: &str) -> String {
    format!("Topic: {topic}")
}

/// Parse a planner reply. Strips one enclosing code fence; no other repair.
/// Keeps at most `MAX_SUBTASKS` sub-topics.
pub fn parse_plan(raw: &str) -> Result<PlannerOutput, PlanParseError> {
    let response: PlanResponse = serde_json::from_str(ai_client::strip_code_blocks(raw))?;

    if response.main_search_query.trim().is_empty() {
        return Err(PlanParseError::BlankMainQuery);
    }
    if response.subtasks.is_empty() {
        return Err(PlanParseError::NoSubtasks);
    }

    let subtasks = response
        .subtasks
        .into_iter()
        .take(MAX_SUBTASKS)
        .enumerate()
        .map(|(i, s)| {
            if s.title.trim().is_empty() || s.search_query.trim().is_empty() {
                return Err(PlanParseError::BlankSubtask(i));
            }
            Ok(Subtask {
                title: s.title.trim().to_string(),
                search_query: s.search_query.trim().to_string(),
                description: s.description,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PlannerOutput {
        subtasks,
        main_search_query: response.main_search_query.trim().to_string(),
    })
}

/// The plan used whenever the planner's reply can't be trusted.
pub fn fallback_plan(topic: &str) -> PlannerOutput {
    PlannerOutput {
        subtasks: vec![
            Subtask::new(
                format!("Introduction to {topic}"),
                format!("{topic} introduction for beginners"),
            )
            .with_description(format!("Start with the basics of {topic}")),
            Subtask::new(
                format!("Core concepts of {topic}"),
                format!("{topic} core concepts explained"),
            )
            .with_description(format!("Understand the key ideas behind {topic}")),
            Subtask::new(
                format!("Practice {topic}"),
                format!("{topic} practice problems"),
            )
            .with_description(format!("Apply what you learned about {topic}")),
        ],
        main_search_query: format!("{topic} tutorial explained"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamKind;
    use crate::testing::MockPlanner;

    const VALID: &str = r#"{
        "subtasks": [
            {"title": "Light reactions", "searchQuery": "light dependent reactions"},
            {"title": "Calvin cycle", "searchQuery": "calvin cycle explained",
             "description": "How plants fix carbon"}
        ],
        "mainSearchQuery": "photosynthesis explained"
    }"#;

    #[test]
    fn parses_valid_plan() {
        let plan = parse_plan(VALID).unwrap();
        assert_eq!(plan.main_search_query, "photosynthesis explained");
        assert_eq!(plan.subtasks.len(), 2);
        assert_eq!(plan.subtasks[0].title, "Light reactions");
        assert_eq!(plan.subtasks[0].search_query, "light dependent reactions");
        assert_eq!(plan.subtasks[1].description.as_deref(), Some("How plants fix carbon"));
    }

    #[test]
    fn parses_fenced_plan() {
        let fenced = format!("```json\n{VALID}\n```");
        assert_eq!(parse_plan(&fenced).unwrap(), parse_plan(VALID).unwrap());

        let one_line = r#"```json{"subtasks":[{"title":"Light reactions","searchQuery":"light dependent reactions"}],"mainSearchQuery":"m"}```"#;
        let plan = parse_plan(one_line).unwrap();
        assert_eq!(plan.main_search_query, "m");
        assert_eq!(plan.subtasks[0].title, "Light reactions");
    }

    #[test]
    fn keeps_only_first_five_subtasks() {
        let items: Vec<String> = (1..=7)
            .map(|i| format!(r#"{{"title": "Step {i}", "searchQuery": "query {i}"}}"#))
            .collect();
        let raw = format!(
            r#"{{"subtasks": [{}], "mainSearchQuery": "main"}}"#,
            items.join(",")
        );
        let plan = parse_plan(&raw).unwrap();
        assert_eq!(plan.subtasks.len(), MAX_SUBTASKS);
        assert_eq!(plan.subtasks[4].title, "Step 5");
    }

    #[test]
    fn rejects_malformed_replies() {
        let cases = [
            "Sure! Here is your plan: ...",
            r#"{"subtasks": [], "mainSearchQuery": "main"}"#,
            r#"{"subtasks": [{"title": "a", "searchQuery": "b"}]}"#,
            r#"{"subtasks": "intro, basics", "mainSearchQuery": "main"}"#,
            r#"{"subtasks": [{"title": "a", "searchQuery": 7}], "mainSearchQuery": "main"}"#,
            r#"{"subtasks": [{"title": " ", "searchQuery": "b"}], "mainSearchQuery": "main"}"#,
            r#"{"subtasks": [{"title": "a", "searchQuery": "b"}], "mainSearchQuery": ""}"#,
            "",
        ];
        for raw in cases {
            assert!(parse_plan(raw).is_err(), "accepted: {raw}");
        }
    }

    #[test]
    fn fallback_plan_is_deterministic() {
        let plan = fallback_plan("Photosynthesis");
        let titles: Vec<_> = plan.subtasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Introduction to Photosynthesis",
                "Core concepts of Photosynthesis",
                "Practice Photosynthesis"
            ]
        );
        assert_eq!(plan.main_search_query, "Photosynthesis tutorial explained");
        assert_eq!(plan, fallback_plan("Photosynthesis"));
    }

    #[test]
    fn system_prompt_embeds_schema() {
        let prompt = system_prompt();
        assert!(prompt.contains("mainSearchQuery"));
        assert!(prompt.contains("searchQuery"));
    }

    #[tokio::test]
    async fn planner_falls_back_on_garbage() {
        let service = Arc::new(MockPlanner::replying("I cannot help with that."));
        let planner = TopicPlanner::new(service.clone());
        let plan = planner.plan("Rust").await.unwrap();
        assert_eq!(plan, fallback_plan("Rust"));
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn planner_uses_valid_reply() {
        let planner = TopicPlanner::new(Arc::new(MockPlanner::replying(VALID)));
        let plan = planner.plan("Photosynthesis").await.unwrap();
        assert_eq!(plan.subtasks.len(), 2);
    }

    #[tokio::test]
    async fn planner_propagates_upstream_failure() {
        let planner = TopicPlanner::new(Arc::new(MockPlanner::failing(UpstreamKind::RateLimited)));
        let err = planner.plan("Rust").await.unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::UpstreamPlanning { kind: UpstreamKind::RateLimited, .. }
        ));
    }
}
