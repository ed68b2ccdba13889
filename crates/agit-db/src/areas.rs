//! Database operations for the `areas` table.

use agit_core::verification::VerificationState;
use agit_core::{Area, Coordinate};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const AREA_COLUMNS: &str = "id, name, address, latitude, longitude, is_indoor, verification_count, \
     is_verified, is_public_data, public_data_source, public_data_updated_at, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `areas` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AreaRow {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_indoor: bool,
    pub verification_count: i32,
    pub is_verified: bool,
    pub is_public_data: bool,
    pub public_data_source: Option<String>,
    pub public_data_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AreaRow {
    #[must_use]
    pub fn into_area(self) -> Area {
        Area {
            id: self.id,
            name: self.name,
            address: self.address,
            coordinate: Coordinate::new(self.latitude, self.longitude),
            is_indoor: self.is_indoor,
            verification_count: self.verification_count,
            is_verified: self.is_verified,
            is_public_data: self.is_public_data,
            public_data_source: self.public_data_source,
            public_data_updated_at: self.public_data_updated_at,
            created_at: self.created_at,
        }
    }
}

/// A row from `find_nearby_areas`: the area plus its distance from the query point.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NearbyAreaRow {
    #[sqlx(flatten)]
    pub area: AreaRow,
    pub distance_m: f64,
}

/// Input for inserting a new area.
#[derive(Debug, Clone)]
pub struct NewArea {
    pub name: String,
    pub address: String,
    pub coordinate: Coordinate,
    pub is_indoor: bool,
    pub state: VerificationState,
    /// Provenance label; `Some` marks the row as public data.
    pub public_data_source: Option<String>,
}

/// Filters for [`list_verified_areas`].
#[derive(Debug, Clone, Default)]
pub struct AreaFilter {
    /// Case-insensitive substring matched against name and address.
    pub search: Option<String>,
    /// Restrict to this user's favorites.
    pub favorites_of: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Verified areas, newest first, narrowed by `filter`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_verified_areas(
    pool: &PgPool,
    filter: &AreaFilter,
) -> Result<Vec<AreaRow>, DbError> {
    let pattern = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", escape_like(s)));

    let rows = sqlx::query_as::<_, AreaRow>(&format!(
        "SELECT {AREA_COLUMNS} \
         FROM areas a \
         WHERE a.is_verified \
           AND ($1::text IS NULL OR a.name ILIKE $1 OR a.address ILIKE $1) \
           AND ($2::uuid IS NULL OR EXISTS ( \
                SELECT 1 FROM favorites f WHERE f.area_id = a.id AND f.user_id = $2)) \
         ORDER BY a.created_at DESC"
    ))
    .bind(pattern)
    .bind(filter.favorites_of)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no area has `id`, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_area(pool: &PgPool, id: Uuid) -> Result<AreaRow, DbError> {
    sqlx::query_as::<_, AreaRow>(&format!("SELECT {AREA_COLUMNS} FROM areas WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Nearest area within `radius_m` of `at`, ties broken by creation order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_nearest_area(
    pool: &PgPool,
    at: Coordinate,
    radius_m: f64,
) -> Result<Option<NearbyAreaRow>, DbError> {
    let row = sqlx::query_as::<_, NearbyAreaRow>(
        "SELECT * FROM find_nearby_areas($1, $2, $3) LIMIT 1",
    )
    .bind(at.latitude)
    .bind(at.longitude)
    .bind(radius_m)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_area(pool: &PgPool, area: &NewArea) -> Result<AreaRow, DbError> {
    let is_public_data = area.public_data_source.is_some();
    let row = sqlx::query_as::<_, AreaRow>(&format!(
        "INSERT INTO areas \
             (name, address, latitude, longitude, is_indoor, verification_count, is_verified, \
              is_public_data, public_data_source, public_data_updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, CASE WHEN $8 THEN NOW() END) \
         RETURNING {AREA_COLUMNS}"
    ))
    .bind(&area.name)
    .bind(&area.address)
    .bind(area.coordinate.latitude)
    .bind(area.coordinate.longitude)
    .bind(area.is_indoor)
    .bind(area.state.verification_count)
    .bind(area.state.is_verified)
    .bind(is_public_data)
    .bind(&area.public_data_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Overwrite an area's counter and verified flag. Concurrent writers race;
/// the last one wins.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no area has `id`, or [`DbError::Sqlx`]
/// if the update fails.
pub async fn update_verification(
    pool: &PgPool,
    id: Uuid,
    state: VerificationState,
) -> Result<AreaRow, DbError> {
    sqlx::query_as::<_, AreaRow>(&format!(
        "UPDATE areas \
         SET verification_count = $2, is_verified = $3, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {AREA_COLUMNS}"
    ))
    .bind(id)
    .bind(state.verification_count)
    .bind(state.is_verified)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Whether a public-data area already sits at exactly `at`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn public_area_exists_at(pool: &PgPool, at: Coordinate) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS ( \
             SELECT 1 FROM areas \
             WHERE latitude = $1 AND longitude = $2 AND is_public_data)",
    )
    .bind(at.latitude)
    .bind(at.longitude)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
