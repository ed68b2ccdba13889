use agit_core::Coordinate;
use agit_geocoder::GeocodedAddress;
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_geocode_error, require_geocoder, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ForwardQuery {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReverseQuery {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct ReverseResponse {
    address: String,
    latitude: f64,
    longitude: f64,
}

/// GET /api/v1/geocode?query=
pub(super) async fn forward(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ForwardQuery>,
) -> Result<Json<ApiResponse<GeocodedAddress>>, ApiError> {
    let geocoder = require_geocoder(&req_id.0, &state)?;

    let found = geocoder
        .geocode_address(&query.query)
        .await
        .map_err(|e| map_geocode_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(found, req_id.0)))
}

/// GET /api/v1/geocode/reverse?lat=&lng=
pub(super) async fn reverse(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ReverseQuery>,
) -> Result<Json<ApiResponse<ReverseResponse>>, ApiError> {
    let rid = &req_id.0;
    let coordinate = Coordinate::new(query.lat, query.lng)
        .validate()
        .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?;
    let geocoder = require_geocoder(rid, &state)?;

    let address = geocoder
        .reverse_geocode(coordinate)
        .await
        .map_err(|e| map_geocode_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        ReverseResponse {
            address,
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        },
        req_id.0,
    )))
}
