//! Report submission: proximity dedup, crowd verification, and the
//! `area_reports` trail.

use agit_core::verification::{
    apply_report, check_report_distance, ReportForm, VerificationState, REPORT_BONUS_POINTS,
};
use agit_core::Coordinate;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::areas::{find_nearest_area, insert_area, update_verification, NewArea};
use crate::profiles::add_points;
use crate::DbError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A row from the `area_reports` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AreaReportRow {
    pub id: i64,
    pub area_id: Uuid,
    pub reporter_id: Option<Uuid>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
}

/// What the reporter sent: where they stand, where the area is, and a
/// description used if the area turns out to be new.
#[derive(Debug, Clone)]
pub struct ReportSubmission {
    pub reporter_location: Coordinate,
    pub location: Coordinate,
    pub form: ReportForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
    pub area_id: Uuid,
    pub verification_count: i32,
    /// True only for the report that crossed the verification threshold.
    pub auto_verified: bool,
    pub created_new_area: bool,
    pub points_awarded: i64,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Submit a report, merging it into the nearest area within `dedup_radius_m`
/// or creating a new one.
///
/// The distance gate and form checks run before any write. The area write,
/// the report row, and the points award are separate statements; a failure
/// part-way leaves the earlier writes in place.
///
/// # Errors
///
/// Returns [`DbError::Validation`] when the reporter is too far away or the
/// form is incomplete, [`DbError::NotFound`] if the matched area or the
/// reporter's profile disappears mid-request, or [`DbError::Sqlx`] on a
/// store failure.
pub async fn submit_report(
    pool: &PgPool,
    reporter_id: Option<Uuid>,
    submission: ReportSubmission,
    dedup_radius_m: f64,
) -> Result<ReportOutcome, DbError> {
    check_report_distance(submission.reporter_location, submission.location)?;
    let form = submission.form.validate()?;

    let (area_id, verification_count, auto_verified, created_new_area) =
        match find_nearest_area(pool, submission.location, dedup_radius_m).await? {
            Some(nearby) => {
                let existing = nearby.area;
                let state = apply_report(existing.verification_count, existing.is_public_data);
                let updated = update_verification(pool, existing.id, state).await?;
                (
                    updated.id,
                    updated.verification_count,
                    state.is_verified && !existing.is_verified,
                    false,
                )
            }
            None => {
                let created = insert_area(
                    pool,
                    &NewArea {
                        name: form.name,
                        address: form.address,
                        coordinate: submission.location,
                        is_indoor: form.is_indoor,
                        state: VerificationState::first_report(),
                        public_data_source: None,
                    },
                )
                .await?;
                (created.id, created.verification_count, false, true)
            }
        };

    insert_area_report(pool, area_id, reporter_id, submission.reporter_location).await?;

    let points_awarded = match reporter_id {
        Some(user_id) => {
            add_points(pool, user_id, REPORT_BONUS_POINTS).await?;
            REPORT_BONUS_POINTS
        }
        None => 0,
    };

    Ok(ReportOutcome {
        area_id,
        verification_count,
        auto_verified,
        created_new_area,
        points_awarded,
    })
}

/// Record who reported `area_id` and where they stood.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_area_report(
    pool: &PgPool,
    area_id: Uuid,
    reporter_id: Option<Uuid>,
    reporter_location: Coordinate,
) -> Result<AreaReportRow, DbError> {
    let row = sqlx::query_as::<_, AreaReportRow>(
        "INSERT INTO area_reports (area_id, reporter_id, latitude, longitude) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, area_id, reporter_id, latitude, longitude, created_at",
    )
    .bind(area_id)
    .bind(reporter_id)
    .bind(reporter_location.latitude)
    .bind(reporter_location.longitude)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
