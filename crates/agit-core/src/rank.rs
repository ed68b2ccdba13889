//! Point-based rank tiers.

use serde::Serialize;

/// A rank tier covering the inclusive point range `min_points..=max_points`.
///
/// `max_points == None` means the tier is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rank {
    pub level: u8,
    pub title: &'static str,
    pub min_points: i64,
    pub max_points: Option<i64>,
}

impl Rank {
    #[must_use]
    pub fn contains(&self, points: i64) -> bool {
        points >= self.min_points && self.max_points.is_none_or(|max| points <= max)
    }
}

pub const RANK_TABLE: [Rank; 6] = [
    Rank {
        level: 1,
        title: "아기 토끼",
        min_points: 0,
        max_points: Some(99),
    },
    Rank {
        level: 2,
        title: "꼬마 토끼",
        min_points: 100,
        max_points: Some(299),
    },
    Rank {
        level: 3,
        title: "탐험 토끼",
        min_points: 300,
        max_points: Some(599),
    },
    Rank {
        level: 4,
        title: "수색 토끼",
        min_points: 600,
        max_points: Some(999),
    },
    Rank {
        level: 5,
        title: "대장 토끼",
        min_points: 1000,
        max_points: Some(1999),
    },
    Rank {
        level: 6,
        title: "황금 토끼",
        min_points: 2000,
        max_points: None,
    },
];

/// Rank for a point total. Totals outside every tier (negative) fall back to the first tier.
#[must_use]
pub fn lookup_rank(points: i64) -> &'static Rank {
    RANK_TABLE
        .iter()
        .find(|rank| rank.contains(points))
        .unwrap_or(&RANK_TABLE[0])
}

/// The tier after the one `points` falls in, or `None` at the top tier.
#[must_use]
pub fn next_rank(points: i64) -> Option<&'static Rank> {
    let current = lookup_rank(points);
    RANK_TABLE.iter().find(|rank| rank.level == current.level + 1)
}

/// Percentage progress (0.0..=100.0) from the current tier's floor to the next tier's floor.
#[must_use]
pub fn progress_to_next(points: i64) -> f64 {
    let current = lookup_rank(points);
    let Some(next) = next_rank(points) else {
        return 100.0;
    };

    // Tier bounds are small constants; the conversion is exact.
    #[allow(clippy::cast_precision_loss)]
    let progress = (points - current.min_points) as f64
        / (next.min_points - current.min_points) as f64
        * 100.0;
    progress.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_contiguous_from_zero() {
        assert_eq!(RANK_TABLE[0].min_points, 0);
        for pair in RANK_TABLE.windows(2) {
            let max = pair[0].max_points.expect("only the last tier is open-ended");
            assert_eq!(pair[1].min_points, max + 1, "gap or overlap after {pair:?}");
        }
        assert!(RANK_TABLE[RANK_TABLE.len() - 1].max_points.is_none());
    }

    #[test]
    fn every_total_matches_exactly_one_tier() {
        for points in (0..=2_500).chain([10_000, i64::MAX]) {
            let matches = RANK_TABLE.iter().filter(|r| r.contains(points)).count();
            assert_eq!(matches, 1, "points {points} matched {matches} tiers");
        }
    }

    #[test]
    fn boundaries_map_to_expected_titles() {
        assert_eq!(lookup_rank(0).title, "아기 토끼");
        assert_eq!(lookup_rank(99).title, "아기 토끼");
        assert_eq!(lookup_rank(100).title, "꼬마 토끼");
        assert_eq!(lookup_rank(599).level, 3);
        assert_eq!(lookup_rank(600).level, 4);
        assert_eq!(lookup_rank(1999).level, 5);
        assert_eq!(lookup_rank(2000).title, "황금 토끼");
    }

    #[test]
    fn negative_totals_fall_back_to_first_tier() {
        assert_eq!(lookup_rank(-50).level, 1);
    }

    #[test]
    fn next_rank_stops_at_top_tier() {
        assert_eq!(next_rank(0).map(|r| r.level), Some(2));
        assert!(next_rank(5_000).is_none());
    }

    #[test]
    fn progress_is_relative_to_tier_span() {
        assert!((progress_to_next(0) - 0.0).abs() < f64::EPSILON);
        assert!((progress_to_next(200) - 50.0).abs() < 1e-9);
        assert!((progress_to_next(2_500) - 100.0).abs() < f64::EPSILON);
    }
}
