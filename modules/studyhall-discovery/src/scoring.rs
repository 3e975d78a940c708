//! Engagement scoring: a bounded popularity metric from views, likes and age.
//!
//! The coefficients below are policy constants carried over unchanged from
//! the production ranking so scores stay comparable across versions.

use chrono::{DateTime, Utc};

use studyhall_common::{PrimaryVideo, RankedVideo, VideoCandidate};

/// Weight on average views per day since publish.
pub const VIEW_VELOCITY_WEIGHT: f64 = 0.5;
/// Weight per like.
pub const LIKE_WEIGHT: f64 = 10.0;
/// Videos strictly above this many views get `POPULARITY_BONUS`.
pub const POPULARITY_THRESHOLD: u64 = 100_000;
pub const POPULARITY_BONUS: f64 = 50.0;
/// Raw score divisor before rounding.
pub const SCORE_SCALE: f64 = 1000.0;
pub const MIN_SCORE: u32 = 1;
pub const MAX_SCORE: u32 = 100;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Score a video in `[MIN_SCORE, MAX_SCORE]`.
///
/// Age is measured in fractional days and floored at one day, so same-day
/// uploads, future timestamps and missing publish dates all count as one day.
pub fn engagement_score(
    view_count: u64,
    like_count: u64,
    published_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> u32 {
    let days = days_since_publish(published_at, now);
    let bonus = if view_count > POPULARITY_THRESHOLD {
        POPULARITY_BONUS
    } else {
        0.0
    };

    let raw = (view_count as f64 / days) * VIEW_VELOCITY_WEIGHT
        + like_count as f64 * LIKE_WEIGHT
        + bonus;

    (raw / SCORE_SCALE)
        .round()
        .clamp(MIN_SCORE as f64, MAX_SCORE as f64) as u32
}

fn days_since_publish(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    published_at
        .map(|p| (now - p).num_milliseconds() as f64 / MILLIS_PER_DAY)
        .unwrap_or(1.0)
        .max(1.0)
}

/// A candidate with its computed score. Only constructed by scoring, and the
/// score cannot change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredVideo {
    candidate: VideoCandidate,
    engagement_score: u32,
}

impl ScoredVideo {
    pub fn score(candidate: VideoCandidate, now: DateTime<Utc>) -> Self {
        let engagement_score = engagement_score(
            candidate.view_count,
            candidate.like_count,
            candidate.published_at,
            now,
        );
        Self {
            candidate,
            engagement_score,
        }
    }

    pub fn candidate(&self) -> &VideoCandidate {
        &self.candidate
    }

    pub fn engagement_score(&self) -> u32 {
        self.engagement_score
    }

    pub fn into_ranked(self, reason: impl Into<String>) -> RankedVideo {
        RankedVideo {
            video_id: self.candidate.video_id,
            title: self.candidate.title,
            channel: self.candidate.channel,
            views: self.candidate.view_count,
            engagement_score: self.engagement_score,
            reason: reason.into(),
        }
    }

    /// Promote to the primary recommendation, with a reason citing its metrics.
    pub fn into_primary(self) -> PrimaryVideo {
        let reason = format!(
            "Highest engagement score ({}/{}) with {} views",
            self.engagement_score,
            MAX_SCORE,
            group_thousands(self.candidate.view_count)
        );
        PrimaryVideo {
            video_id: self.candidate.video_id,
            title: self.candidate.title,
            channel: self.candidate.channel,
            reason,
        }
    }
}

/// Score every candidate and sort by descending score. The sort is stable:
/// equal scores keep the provider's order.
pub fn rank(candidates: Vec<VideoCandidate>, now: DateTime<Utc>) -> Vec<ScoredVideo> {
    let mut scored: Vec<ScoredVideo> = candidates
        .into_iter()
        .map(|c| ScoredVideo::score(c, now))
        .collect();
    scored.sort_by(|a, b| b.engagement_score.cmp(&a.engagement_score));
    scored
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
