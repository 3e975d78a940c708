use std::fmt;

use thiserror::Error;

/// How a planning-service failure should be reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    /// HTTP 429 from the provider.
    RateLimited,
    /// HTTP 402: credits or quota exhausted.
    QuotaExceeded,
    /// Anything else: transport failure, auth failure, 5xx.
    Unavailable,
}

impl UpstreamKind {
    pub fn from_status(status: Option<u16>) -> Self {
        match status {
            Some(429) => UpstreamKind::RateLimited,
            Some(402) => UpstreamKind::QuotaExceeded,
            _ => UpstreamKind::Unavailable,
        }
    }
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamKind::RateLimited => write!(f, "rate limited"),
            UpstreamKind::QuotaExceeded => write!(f, "quota exceeded"),
            UpstreamKind::Unavailable => write!(f, "unavailable"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    #[error("Planning service {kind}: {message}")]
    UpstreamPlanning { kind: UpstreamKind, message: String },

    #[error("Video search failed: {message}")]
    SearchFailure { status: Option<u16>, message: String },

    #[error("No primary video found: {0}")]
    NoPrimaryVideoFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ai_client::AiError> for DiscoveryError {
    fn from(err: ai_client::AiError) -> Self {
        DiscoveryError::UpstreamPlanning {
            kind: UpstreamKind::from_status(err.status()),
            message: err.to_string(),
        }
    }
}

impl From<youtube_client::YouTubeError> for DiscoveryError {
    fn from(err: youtube_client::YouTubeError) -> Self {
        DiscoveryError::SearchFailure {
            status: err.status(),
            message: err.to_string(),
        }
    }
}
