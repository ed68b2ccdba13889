use agit_core::{compute_trust, Area, Session, TrustBand, TrustBasis, TrustScore};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::reviews::ReviewItem;
use super::{map_db_error, require_user, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct AreasQuery {
    /// Case-insensitive match on name or address.
    pub q: Option<String>,
    /// Only the caller's favorites; requires sign-in.
    #[serde(default)]
    pub favorites: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct AreaItem {
    id: Uuid,
    name: String,
    address: String,
    latitude: f64,
    longitude: f64,
    is_indoor: bool,
    verification_count: i32,
    is_verified: bool,
    is_public_data: bool,
    public_data_source: Option<String>,
    public_data_updated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<Area> for AreaItem {
    fn from(area: Area) -> Self {
        Self {
            id: area.id,
            name: area.name,
            address: area.address,
            latitude: area.coordinate.latitude,
            longitude: area.coordinate.longitude,
            is_indoor: area.is_indoor,
            verification_count: area.verification_count,
            is_verified: area.is_verified,
            is_public_data: area.is_public_data,
            public_data_source: area.public_data_source,
            public_data_updated_at: area.public_data_updated_at,
            created_at: area.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct TrustItem {
    score: u8,
    band: TrustBand,
    show_warning: bool,
    available_rate: Option<f64>,
    basis: TrustBasis,
}

impl From<TrustScore> for TrustItem {
    fn from(trust: TrustScore) -> Self {
        Self {
            score: trust.score,
            band: trust.band(),
            show_warning: trust.show_warning,
            available_rate: trust.available_rate,
            basis: trust.basis,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct AreaDetail {
    #[serde(flatten)]
    area: AreaItem,
    review_count: usize,
    average_cleanliness: Option<f64>,
    /// Absent for user-reported areas with no recent reviews.
    trust: Option<TrustItem>,
    is_favorite: bool,
    reviews: Vec<ReviewItem>,
}

pub(super) async fn list_areas(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Query(query): Query<AreasQuery>,
) -> Result<Json<ApiResponse<Vec<AreaItem>>>, ApiError> {
    let favorites_of = if query.favorites {
        Some(require_user(&req_id.0, &session)?)
    } else {
        None
    };

    let filter = agit_db::AreaFilter {
        search: query.q,
        favorites_of,
    };
    let rows = agit_db::list_verified_areas(&state.pool, &filter)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| AreaItem::from(row.into_area()))
        .collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn get_area_detail(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(area_id): Path<Uuid>,
) -> Result<Json<ApiResponse<AreaDetail>>, ApiError> {
    let rid = &req_id.0;
    let area = agit_db::get_area(&state.pool, area_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .into_area();

    let reviews: Vec<_> = agit_db::list_reviews(&state.pool, area_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .into_iter()
        .map(agit_db::ReviewRow::into_review)
        .collect();

    let is_favorite = match session.user_id() {
        Some(user_id) => agit_db::is_favorite(&state.pool, user_id, area_id)
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?,
        None => false,
    };

    let trust = compute_trust(&area, &reviews, Utc::now()).map(TrustItem::from);
    let average_cleanliness = average_cleanliness(&reviews);

    Ok(Json(ApiResponse::new(
        AreaDetail {
            area: AreaItem::from(area),
            review_count: reviews.len(),
            average_cleanliness,
            trust,
            is_favorite,
            reviews: reviews.into_iter().map(ReviewItem::from).collect(),
        },
        req_id.0,
    )))
}

/// Mean cleanliness over all reviews, rounded to one decimal.
fn average_cleanliness(reviews: &[agit_core::Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let total: f64 = reviews.iter().map(|r| f64::from(r.cleanliness)).sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = total / reviews.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(cleanliness: i16) -> agit_core::Review {
        agit_core::Review {
            id: Uuid::new_v4(),
            area_id: Uuid::nil(),
            user_id: None,
            cleanliness,
            is_available: true,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn average_cleanliness_is_none_without_reviews() {
        assert_eq!(average_cleanliness(&[]), None);
    }

    #[test]
    fn average_cleanliness_rounds_to_one_decimal() {
        let reviews = [review(5), review(4), review(4)];
        assert_eq!(average_cleanliness(&reviews), Some(4.3));
    }
}
