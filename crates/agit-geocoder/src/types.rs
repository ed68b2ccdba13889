//! Response shapes of the Kakao Local API, trimmed to the fields used here.

use agit_core::Coordinate;
use serde::{Deserialize, Serialize};

/// A resolved address and where it is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodedAddress {
    pub address: String,
    pub coordinate: Coordinate,
}

/// `GET /v2/local/search/address.json`
#[derive(Debug, Deserialize)]
pub(crate) struct AddressSearchResponse {
    pub documents: Vec<AddressDocument>,
}

/// Coordinates arrive as decimal strings: `x` is longitude, `y` latitude.
#[derive(Debug, Deserialize)]
pub(crate) struct AddressDocument {
    pub address_name: String,
    pub x: String,
    pub y: String,
}

/// `GET /v2/local/geo/coord2address.json`
#[derive(Debug, Deserialize)]
pub(crate) struct CoordToAddressResponse {
    pub documents: Vec<CoordDocument>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CoordDocument {
    pub road_address: Option<NamedAddress>,
    pub address: Option<NamedAddress>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamedAddress {
    pub address_name: String,
}

impl CoordDocument {
    /// Road-name address when known, else the lot-number address.
    pub(crate) fn best_name(self) -> Option<String> {
        self.road_address
            .or(self.address)
            .map(|a| a.address_name)
            .filter(|name| !name.trim().is_empty())
    }
}
