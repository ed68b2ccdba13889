//! Great-circle distance on a spherical earth.

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Reject non-finite values and values outside the lat/lng ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCoordinate`] when either component is out of range.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lng_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lng_ok {
            Ok(self)
        } else {
            Err(ValidationError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    #[must_use]
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_meters(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// Haversine distance in meters between two points given in degrees.
///
/// NaN inputs propagate to a NaN result.
#[must_use]
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEOUL_CITY_HALL: (f64, f64) = (37.566_5, 126.978_0);
    const GANGNAM_STATION: (f64, f64) = (37.497_9, 127.027_6);

    #[test]
    fn identical_points_are_zero_apart() {
        for (lat, lng) in [SEOUL_CITY_HALL, GANGNAM_STATION, (0.0, 0.0), (-89.9, 179.9)] {
            assert!(haversine_meters(lat, lng, lat, lng).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let (a_lat, a_lng) = SEOUL_CITY_HALL;
        let (b_lat, b_lng) = GANGNAM_STATION;
        let ab = haversine_meters(a_lat, a_lng, b_lat, b_lng);
        let ba = haversine_meters(b_lat, b_lng, a_lat, a_lng);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn city_hall_to_gangnam_is_about_8_7_km() {
        let (a_lat, a_lng) = SEOUL_CITY_HALL;
        let (b_lat, b_lng) = GANGNAM_STATION;
        let d = haversine_meters(a_lat, a_lng, b_lat, b_lng);
        assert!((8_500.0..9_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn one_thousandth_degree_latitude_is_about_111_m() {
        let d = haversine_meters(37.0, 127.0, 37.001, 127.0);
        assert!((d - 111.19).abs() < 0.5, "got {d}");
    }

    #[test]
    fn nan_propagates() {
        assert!(haversine_meters(f64::NAN, 0.0, 0.0, 0.0).is_nan());
    }

    #[test]
    fn coordinate_validation_rejects_out_of_range() {
        assert!(Coordinate::new(91.0, 0.0).validate().is_err());
        assert!(Coordinate::new(0.0, -180.5).validate().is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).validate().is_err());
        assert!(Coordinate::new(37.5, 127.0).validate().is_ok());
    }
}
