pub mod discovery;
pub mod error;
pub mod planner;
pub mod scoring;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use discovery::{validate_topic, VideoDiscovery};
pub use error::{DiscoveryError, UpstreamKind};
pub use planner::{fallback_plan, parse_plan, PlanParseError, TopicPlanner};
pub use scoring::{engagement_score, rank, ScoredVideo};
pub use traits::{PlanningService, SearchService};
