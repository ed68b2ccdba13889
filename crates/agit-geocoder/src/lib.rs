//! Forward and reverse geocoding against the Kakao Local REST API.

pub mod backfill;
pub mod client;
pub mod error;
pub mod types;

pub use backfill::{backfill_coordinates, Backfilled};
pub use client::{GeocoderConfig, KakaoGeocoder};
pub use error::GeocodeError;
pub use types::GeocodedAddress;
