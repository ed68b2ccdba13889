//! Database operations for the `profiles` table, including the points ledger.

use agit_core::{lookup_rank, validate_nickname, Identity, SessionProfile};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::DbError;

const PROFILE_COLUMNS: &str = "id, email, nickname, points, rank, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `profiles` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub email: Option<String>,
    pub nickname: String,
    pub points: i64,
    pub rank: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRow {
    #[must_use]
    pub fn to_session_profile(&self) -> SessionProfile {
        SessionProfile {
            id: self.id,
            email: self.email.clone(),
            nickname: self.nickname.clone(),
            points: self.points,
            rank: self.rank.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::NotFound`] if no profile has `id`, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_profile(pool: &PgPool, id: Uuid) -> Result<ProfileRow, DbError> {
    find_profile(pool, id).await?.ok_or(DbError::NotFound)
}

async fn find_profile(pool: &PgPool, id: Uuid) -> Result<Option<ProfileRow>, DbError> {
    let row = sqlx::query_as::<_, ProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Load the caller's profile, creating it on first sight.
///
/// A new profile starts at zero points with a nickname from the display
/// name; if that nickname is taken, an id-derived one is used instead.
///
/// # Errors
///
/// Returns [`DbError::Conflict`] if neither nickname candidate is free, or
/// [`DbError::Sqlx`] if a query fails.
pub async fn ensure_profile(pool: &PgPool, identity: &Identity) -> Result<ProfileRow, DbError> {
    if let Some(existing) = find_profile(pool, identity.user_id).await? {
        return Ok(existing);
    }

    let starting_rank = lookup_rank(0).title;
    for nickname in [identity.default_nickname(), identity.fallback_nickname()] {
        let inserted = sqlx::query_as::<_, ProfileRow>(&format!(
            "INSERT INTO profiles (id, email, nickname, points, rank) \
             VALUES ($1, $2, $3, 0, $4) \
             ON CONFLICT DO NOTHING \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(identity.user_id)
        .bind(&identity.email)
        .bind(&nickname)
        .bind(starting_rank)
        .fetch_optional(pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(row);
        }
        // Either a concurrent request created this profile or the nickname is taken.
        if let Some(existing) = find_profile(pool, identity.user_id).await? {
            return Ok(existing);
        }
    }

    Err(DbError::Conflict(format!(
        "no free nickname for user {}",
        identity.user_id
    )))
}

/// Add `delta` (possibly negative) to a user's points and recompute the rank.
///
/// The row is locked for the read-modify-write, so concurrent calls compose.
/// Negative totals are not rejected here; callers that spend points check
/// the balance first.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no profile has `user_id`, or
/// [`DbError::Sqlx`] if the transaction fails.
pub async fn add_points(pool: &PgPool, user_id: Uuid, delta: i64) -> Result<ProfileRow, DbError> {
    let mut tx = pool.begin().await?;
    let current = lock_points(&mut tx, user_id).await?;
    let row = write_points(&mut tx, user_id, current.saturating_add(delta)).await?;
    tx.commit().await?;
    Ok(row)
}

/// `SELECT … FOR UPDATE` the current balance.
pub(crate) async fn lock_points(conn: &mut PgConnection, user_id: Uuid) -> Result<i64, DbError> {
    sqlx::query_scalar::<_, i64>("SELECT points FROM profiles WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .ok_or(DbError::NotFound)
}

/// Write points and the matching rank in one statement.
pub(crate) async fn write_points(
    conn: &mut PgConnection,
    user_id: Uuid,
    points: i64,
) -> Result<ProfileRow, DbError> {
    sqlx::query_as::<_, ProfileRow>(&format!(
        "UPDATE profiles \
         SET points = $2, rank = $3, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(user_id)
    .bind(points)
    .bind(lookup_rank(points).title)
    .fetch_optional(conn)
    .await?
    .ok_or(DbError::NotFound)
}

/// Change a user's nickname.
///
/// # Errors
///
/// Returns [`DbError::Validation`] for a nickname outside 2..=20 characters,
/// [`DbError::Conflict`] if another user holds it, [`DbError::NotFound`] if
/// no profile has `user_id`, or [`DbError::Sqlx`] if the update fails.
pub async fn update_nickname(
    pool: &PgPool,
    user_id: Uuid,
    requested: &str,
) -> Result<ProfileRow, DbError> {
    let nickname = validate_nickname(requested)?;

    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM profiles WHERE nickname = $1 AND id <> $2)",
    )
    .bind(&nickname)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    if taken {
        return Err(DbError::Conflict(format!("nickname '{nickname}' is taken")));
    }

    let result = sqlx::query_as::<_, ProfileRow>(&format!(
        "UPDATE profiles SET nickname = $2, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(user_id)
    .bind(&nickname)
    .fetch_optional(pool)
    .await;

    match result {
        Ok(Some(row)) => Ok(row),
        Ok(None) => Err(DbError::NotFound),
        // Lost a race with another user claiming the same nickname.
        Err(e) if DbError::is_unique_violation(&e) => {
            Err(DbError::Conflict(format!("nickname '{nickname}' is taken")))
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a user's profile.
///
/// Favorites go with it; reviews, reports, and gift exchanges stay but lose
/// their author reference.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no profile has `user_id`, or
/// [`DbError::Sqlx`] if the transaction fails.
pub async fn delete_profile(pool: &PgPool, user_id: Uuid) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    for statement in [
        "UPDATE reviews SET user_id = NULL WHERE user_id = $1",
        "UPDATE area_reports SET reporter_id = NULL WHERE reporter_id = $1",
        "UPDATE gift_exchanges SET user_id = NULL WHERE user_id = $1",
    ] {
        sqlx::query(statement).bind(user_id).execute(&mut *tx).await?;
    }

    let deleted = sqlx::query("DELETE FROM profiles WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(DbError::NotFound);
    }

    tx.commit().await?;
    Ok(())
}
