use agit_core::{Review, Session};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(in crate::api) struct CreateReviewRequest {
    pub cleanliness: i16,
    pub is_available: bool,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ReviewItem {
    id: Uuid,
    area_id: Uuid,
    /// `None` for anonymous reviews and for deleted accounts.
    user_id: Option<Uuid>,
    cleanliness: i16,
    is_available: bool,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<Review> for ReviewItem {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            area_id: review.area_id,
            user_id: review.user_id,
            cleanliness: review.cleanliness,
            is_available: review.is_available,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/areas/{area_id}/reviews: newest first.
pub(in crate::api) async fn list_area_reviews(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(area_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ReviewItem>>>, ApiError> {
    let rid = &req_id.0;
    agit_db::get_area(&state.pool, area_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let data = agit_db::list_reviews(&state.pool, area_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .into_iter()
        .map(|row| ReviewItem::from(row.into_review()))
        .collect();

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// POST /api/v1/areas/{area_id}/reviews: signed-in callers are recorded as author.
pub(in crate::api) async fn create_area_review(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(area_id): Path<Uuid>,
    Json(body): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewItem>>), ApiError> {
    let review = agit_db::NewReview {
        cleanliness: body.cleanliness,
        is_available: body.is_available,
        comment: body.comment,
    };

    let row = agit_db::create_review(&state.pool, area_id, session.user_id(), review)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(area_id = %area_id, review_id = %row.id, "review created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            ReviewItem::from(row.into_review()),
            req_id.0,
        )),
    ))
}
