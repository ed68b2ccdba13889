//! Database operations for the `favorites` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::areas::get_area;
use crate::DbError;

/// Flip whether `area_id` is among `user_id`'s favorites. Returns the new state.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the area does not exist, or
/// [`DbError::Sqlx`] if a query fails.
pub async fn toggle_favorite(pool: &PgPool, user_id: Uuid, area_id: Uuid) -> Result<bool, DbError> {
    get_area(pool, area_id).await?;

    let removed = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND area_id = $2")
        .bind(user_id)
        .bind(area_id)
        .execute(pool)
        .await?
        .rows_affected();
    if removed > 0 {
        return Ok(false);
    }

    sqlx::query(
        "INSERT INTO favorites (user_id, area_id) VALUES ($1, $2) \
         ON CONFLICT (user_id, area_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(area_id)
    .execute(pool)
    .await?;

    Ok(true)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn is_favorite(pool: &PgPool, user_id: Uuid, area_id: Uuid) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM favorites WHERE user_id = $1 AND area_id = $2)",
    )
    .bind(user_id)
    .bind(area_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Favorite area ids, most recently added first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_favorite_area_ids(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>, DbError> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT area_id FROM favorites WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
