use agit_core::{find_gift, Gift, Session, GIFT_CATALOG};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, require_user, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ExchangeItem {
    id: Uuid,
    gift_id: String,
    gift_name: String,
    points_used: i64,
    created_at: DateTime<Utc>,
}

impl From<agit_db::GiftExchangeRow> for ExchangeItem {
    fn from(row: agit_db::GiftExchangeRow) -> Self {
        Self {
            id: row.id,
            gift_id: row.gift_id,
            gift_name: row.gift_name,
            points_used: row.points_used,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct RedeemResponse {
    exchange: ExchangeItem,
    points_remaining: i64,
    rank: String,
}

/// GET /api/v1/gifts
pub(super) async fn list_catalog(
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<Gift>>> {
    Json(ApiResponse::new(GIFT_CATALOG.to_vec(), req_id.0))
}

/// POST /api/v1/gifts/{gift_id}/redeem
pub(super) async fn redeem(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Path(gift_id): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<RedeemResponse>>), ApiError> {
    let rid = &req_id.0;
    let user_id = require_user(rid, &session)?;
    let gift = find_gift(&gift_id)
        .ok_or_else(|| ApiError::new(rid, "not_found", format!("unknown gift '{gift_id}'")))?;

    let redemption = agit_db::redeem_gift(&state.pool, user_id, gift)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(
        user_id = %user_id,
        gift_id = gift.id,
        points_used = gift.cost,
        "gift redeemed"
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            RedeemResponse {
                exchange: ExchangeItem::from(redemption.exchange),
                points_remaining: redemption.profile.points,
                rank: redemption.profile.rank,
            },
            req_id.0,
        )),
    ))
}

/// GET /api/v1/me/gifts: the caller's exchange history, newest first.
pub(super) async fn list_my_exchanges(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<Vec<ExchangeItem>>>, ApiError> {
    let user_id = require_user(&req_id.0, &session)?;

    let data = agit_db::list_gift_exchanges(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .into_iter()
        .map(ExchangeItem::from)
        .collect();

    Ok(Json(ApiResponse::new(data, req_id.0)))
}
