//! Gift redemption against the points ledger.

use agit_core::Gift;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::profiles::{lock_points, write_points, ProfileRow};
use crate::DbError;

/// A row from the `gift_exchanges` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GiftExchangeRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub gift_id: String,
    pub gift_name: String,
    pub points_used: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GiftRedemption {
    pub exchange: GiftExchangeRow,
    pub profile: ProfileRow,
}

/// Spend points on `gift`: check the balance, record the exchange, then debit.
///
/// All three steps share one transaction holding the profile row lock, so
/// two redemptions cannot both pass the balance check.
///
/// # Errors
///
/// Returns [`DbError::Validation`] when the balance is below the cost,
/// [`DbError::NotFound`] if no profile has `user_id`, or [`DbError::Sqlx`]
/// if the transaction fails.
pub async fn redeem_gift(
    pool: &PgPool,
    user_id: Uuid,
    gift: &Gift,
) -> Result<GiftRedemption, DbError> {
    let mut tx = pool.begin().await?;

    let balance = lock_points(&mut tx, user_id).await?;
    gift.check_affordable(balance)?;

    let exchange = sqlx::query_as::<_, GiftExchangeRow>(
        "INSERT INTO gift_exchanges (user_id, gift_id, gift_name, points_used) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, user_id, gift_id, gift_name, points_used, created_at",
    )
    .bind(user_id)
    .bind(gift.id)
    .bind(gift.name)
    .bind(gift.cost)
    .fetch_one(&mut *tx)
    .await?;

    let profile = write_points(&mut tx, user_id, balance - gift.cost).await?;
    tx.commit().await?;

    Ok(GiftRedemption { exchange, profile })
}

/// A user's exchanges, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_gift_exchanges(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<GiftExchangeRow>, DbError> {
    let rows = sqlx::query_as::<_, GiftExchangeRow>(
        "SELECT id, user_id, gift_id, gift_name, points_used, created_at \
         FROM gift_exchanges \
         WHERE user_id = $1 \
         ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
