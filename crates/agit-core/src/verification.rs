//! Report admission and crowd-verification policy.
//!
//! The store-facing half (nearest lookup, area write, report row, points)
//! lives in `agit_db::reports`; everything here is pure.

use serde::Deserialize;

use crate::geo::Coordinate;
use crate::ValidationError;

/// User reports needed before an area is shown as verified.
pub const VERIFICATION_THRESHOLD: i32 = 3;

pub const DEFAULT_DEDUP_RADIUS_M: f64 = 50.0;
pub const MIN_DEDUP_RADIUS_M: f64 = 5.0;
pub const MAX_DEDUP_RADIUS_M: f64 = 50.0;

/// Reporter must stand within this distance of the location they submit.
pub const MAX_REPORT_DISTANCE_M: f64 = 100.0;

pub const REPORT_BONUS_POINTS: i64 = 100;

/// Counter value for bulk-imported rows. The counter only counts user
/// reports; public provenance alone marks a row verified.
pub const PUBLIC_DATA_VERIFICATION_COUNT: i32 = 0;

/// Free-text fields submitted with a report. Only used when a new area is created.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportForm {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub is_indoor: bool,
}

impl ReportForm {
    /// Trim fields and reject blanks.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] for an empty name or address.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let name = self.name.trim().to_string();
        let address = self.address.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if address.is_empty() {
            return Err(ValidationError::MissingField("address"));
        }
        Ok(Self {
            name,
            address,
            is_indoor: self.is_indoor,
        })
    }
}

/// Counter and flag to persist after a report lands on an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationState {
    pub verification_count: i32,
    pub is_verified: bool,
}

impl VerificationState {
    /// State of an area created by its first report.
    #[must_use]
    pub fn first_report() -> Self {
        Self {
            verification_count: 1,
            is_verified: false,
        }
    }

    /// State of a bulk-imported public-data area.
    #[must_use]
    pub fn public_data() -> Self {
        Self {
            verification_count: PUBLIC_DATA_VERIFICATION_COUNT,
            is_verified: true,
        }
    }
}

/// Merge one more report into an existing area's counter.
#[must_use]
pub fn apply_report(current_count: i32, is_public_data: bool) -> VerificationState {
    let verification_count = current_count.saturating_add(1);
    VerificationState {
        verification_count,
        is_verified: verification_count >= VERIFICATION_THRESHOLD || is_public_data,
    }
}

/// Distance gate between where the reporter stands and what they submit.
///
/// Both coordinates are range-checked first. Returns the distance in meters
/// on success.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidCoordinate`] for an out-of-range
/// coordinate and [`ValidationError::OutOfRange`] when the points are more
/// than [`MAX_REPORT_DISTANCE_M`] apart.
pub fn check_report_distance(
    reporter: Coordinate,
    candidate: Coordinate,
) -> Result<f64, ValidationError> {
    let reporter = reporter.validate()?;
    let candidate = candidate.validate()?;
    let distance_m = reporter.distance_to(&candidate);
    if distance_m > MAX_REPORT_DISTANCE_M {
        return Err(ValidationError::OutOfRange {
            distance_m,
            limit_m: MAX_REPORT_DISTANCE_M,
        });
    }
    Ok(distance_m)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, address: &str) -> ReportForm {
        ReportForm {
            name: name.to_string(),
            address: address.to_string(),
            is_indoor: false,
        }
    }

    #[test]
    fn second_report_stays_unverified() {
        let state = apply_report(1, false);
        assert_eq!(state.verification_count, 2);
        assert!(!state.is_verified);
    }

    #[test]
    fn third_report_promotes_to_verified() {
        let state = apply_report(2, false);
        assert_eq!(state.verification_count, 3);
        assert!(state.is_verified);
    }

    #[test]
    fn public_data_stays_verified_from_any_count() {
        let state = apply_report(PUBLIC_DATA_VERIFICATION_COUNT, true);
        assert_eq!(state.verification_count, 1);
        assert!(state.is_verified);
        assert!(VerificationState::public_data().is_verified);
    }

    #[test]
    fn first_report_is_unverified_with_count_one() {
        assert_eq!(
            VerificationState::first_report(),
            VerificationState {
                verification_count: 1,
                is_verified: false
            }
        );
    }

    #[test]
    fn counter_saturates_instead_of_wrapping() {
        assert_eq!(apply_report(i32::MAX, false).verification_count, i32::MAX);
    }

    #[test]
    fn report_within_range_passes() {
        let here = Coordinate::new(37.5665, 126.9780);
        let nearby = Coordinate::new(37.5670, 126.9780);
        let d = check_report_distance(here, nearby).expect("about 56m apart");
        assert!(d < MAX_REPORT_DISTANCE_M);
    }

    #[test]
    fn report_beyond_100m_is_rejected() {
        let here = Coordinate::new(37.5665, 126.9780);
        let far = Coordinate::new(37.5675, 126.9780);
        let err = check_report_distance(here, far).unwrap_err();
        assert!(
            matches!(err, ValidationError::OutOfRange { distance_m, .. } if distance_m > 100.0),
            "got {err:?}"
        );
    }

    #[test]
    fn report_with_invalid_coordinate_is_rejected() {
        let err = check_report_distance(Coordinate::new(95.0, 0.0), Coordinate::new(0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCoordinate { .. }));
    }

    #[test]
    fn form_fields_are_trimmed_and_required() {
        let ok = form("  Exit 3 ", " Jongno-gu ").validate().unwrap();
        assert_eq!(ok.name, "Exit 3");
        assert_eq!(ok.address, "Jongno-gu");

        assert_eq!(
            form("   ", "addr").validate().unwrap_err(),
            ValidationError::MissingField("name")
        );
        assert_eq!(
            form("name", "").validate().unwrap_err(),
            ValidationError::MissingField("address")
        );
    }
}
