use agit_core::Session;
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, require_user, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct FavoriteState {
    area_id: Uuid,
    is_favorite: bool,
}

/// POST /api/v1/areas/{area_id}/favorite: flips the caller's favorite flag.
pub(super) async fn toggle_area_favorite(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(area_id): Path<Uuid>,
) -> Result<Json<ApiResponse<FavoriteState>>, ApiError> {
    let user_id = require_user(&req_id.0, &session)?;

    let is_favorite = agit_db::toggle_favorite(&state.pool, user_id, area_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        FavoriteState {
            area_id,
            is_favorite,
        },
        req_id.0,
    )))
}

/// GET /api/v1/me/favorites: ids of the caller's favorite areas.
pub(super) async fn list_my_favorites(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<Vec<Uuid>>>, ApiError> {
    let user_id = require_user(&req_id.0, &session)?;

    let ids = agit_db::list_favorite_area_ids(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(ids, req_id.0)))
}
