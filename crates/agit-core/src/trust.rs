//! Display trust score for an area, derived from recent reviews or from
//! how fresh its public-data import is.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{Area, Review};

const REVIEW_WINDOW_DAYS: i64 = 7;
const WARNING_WINDOW_HOURS: i64 = 24;
const AVAILABILITY_WEIGHT: f64 = 0.6;
const CLEANLINESS_WEIGHT: f64 = 0.4;
const MAX_CLEANLINESS: f64 = 5.0;

const RECENCY_FLOOR: f64 = 20.0;
const RECENCY_BONUS_MAX: f64 = 50.0;
const RECENCY_DECAY_PER_DAY: f64 = 1.5;

/// Which input the score was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustBasis {
    RecentReviews,
    PublicDataRecency,
}

/// Coarse display band for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustBand {
    Good,
    Caution,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrustScore {
    pub score: u8,
    pub show_warning: bool,
    /// Share of windowed reviews marked available; `None` for recency-based scores.
    pub available_rate: Option<f64>,
    pub basis: TrustBasis,
}

impl TrustScore {
    #[must_use]
    pub fn band(&self) -> TrustBand {
        match self.score {
            80.. => TrustBand::Good,
            50..=79 => TrustBand::Caution,
            _ => TrustBand::Poor,
        }
    }
}

/// Compute the trust score of `area` at time `now`.
///
/// Only reviews newer than seven days count toward the score. With none,
/// public-data areas get a score that decays with days since ingestion and
/// user-reported areas get `None`.
#[must_use]
pub fn compute_trust(area: &Area, reviews: &[Review], now: DateTime<Utc>) -> Option<TrustScore> {
    let window_start = now - Duration::days(REVIEW_WINDOW_DAYS);
    let windowed: Vec<&Review> = reviews
        .iter()
        .filter(|r| r.created_at > window_start)
        .collect();

    if windowed.is_empty() {
        return area.is_public_data.then(|| TrustScore {
            score: recency_score(area.public_data_updated_at, now),
            show_warning: false,
            available_rate: None,
            basis: TrustBasis::PublicDataRecency,
        });
    }

    // Window sizes are tiny; usize -> f64 is exact here.
    #[allow(clippy::cast_precision_loss)]
    let count = windowed.len() as f64;
    #[allow(clippy::cast_precision_loss)]
    let available_rate = windowed.iter().filter(|r| r.is_available).count() as f64 / count;
    let avg_cleanliness =
        windowed.iter().map(|r| f64::from(r.cleanliness)).sum::<f64>() / count;

    let raw = 100.0
        * (AVAILABILITY_WEIGHT * available_rate
            + CLEANLINESS_WEIGHT * (avg_cleanliness / MAX_CLEANLINESS));

    Some(TrustScore {
        score: to_score(raw),
        show_warning: latest_is_acute_unavailable(reviews, now) && available_rate > 0.5,
        available_rate: Some(available_rate),
        basis: TrustBasis::RecentReviews,
    })
}

/// True when the newest review overall is under a day old and says unavailable.
fn latest_is_acute_unavailable(reviews: &[Review], now: DateTime<Utc>) -> bool {
    let Some(latest) = reviews.iter().max_by_key(|r| r.created_at) else {
        return false;
    };
    latest.created_at > now - Duration::hours(WARNING_WINDOW_HOURS) && !latest.is_available
}

fn recency_score(ingested_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u8 {
    let bonus = ingested_at.map_or(0.0, |ts| {
        // Second resolution is plenty for a day-scale decay.
        #[allow(clippy::cast_precision_loss)]
        let days = (now - ts).num_seconds() as f64 / 86_400.0;
        (RECENCY_BONUS_MAX - RECENCY_DECAY_PER_DAY * days).clamp(0.0, RECENCY_BONUS_MAX)
    });
    to_score(RECENCY_FLOOR + bonus)
}

fn to_score(raw: f64) -> u8 {
    // Clamped to 0..=100 first, so the cast cannot truncate or wrap.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = raw.round().clamp(0.0, 100.0) as u8;
    score
}
