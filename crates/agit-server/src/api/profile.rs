//! The caller's own profile: rank progress, nickname changes, account deletion.

use agit_core::{lookup_rank, next_rank, progress_to_next, Session};
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, require_user, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct UpdateProfileRequest {
    pub nickname: String,
}

#[derive(Debug, Serialize)]
pub(super) struct NextRankItem {
    title: &'static str,
    min_points: i64,
    points_needed: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct ProfileResponse {
    id: Uuid,
    email: Option<String>,
    nickname: String,
    points: i64,
    rank: String,
    rank_level: u8,
    /// Percent of the way from the current tier's floor to the next one.
    rank_progress: f64,
    next_rank: Option<NextRankItem>,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl ProfileResponse {
    fn build(row: agit_db::ProfileRow, is_admin: bool) -> Self {
        let next = next_rank(row.points).map(|rank| NextRankItem {
            title: rank.title,
            min_points: rank.min_points,
            points_needed: rank.min_points - row.points,
        });
        Self {
            id: row.id,
            rank_level: lookup_rank(row.points).level,
            rank_progress: progress_to_next(row.points),
            next_rank: next,
            email: row.email,
            nickname: row.nickname,
            points: row.points,
            rank: row.rank,
            is_admin,
            created_at: row.created_at,
        }
    }
}

/// GET /api/v1/me
pub(super) async fn get_me(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let user_id = require_user(&req_id.0, &session)?;

    let row = agit_db::get_profile(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let is_admin = state.config.is_admin_email(session.email());
    Ok(Json(ApiResponse::new(
        ProfileResponse::build(row, is_admin),
        req_id.0,
    )))
}

/// PATCH /api/v1/me: change nickname; a taken nickname is a `conflict`.
pub(super) async fn update_me(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let user_id = require_user(&req_id.0, &session)?;

    let row = agit_db::update_nickname(&state.pool, user_id, &body.nickname)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let is_admin = state.config.is_admin_email(session.email());
    Ok(Json(ApiResponse::new(
        ProfileResponse::build(row, is_admin),
        req_id.0,
    )))
}

/// DELETE /api/v1/me: authored content stays, anonymised.
pub(super) async fn delete_me(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let user_id = require_user(&req_id.0, &session)?;

    agit_db::delete_profile(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(user_id = %user_id, "account deleted");
    Ok(Json(ApiResponse::new(
        serde_json::json!({ "deleted": true }),
        req_id.0,
    )))
}
