use agit_core::{Coordinate, ReportForm, Session};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct SubmitReportRequest {
    /// Where the smoking area is.
    pub location: Coordinate,
    /// Where the reporter is standing.
    pub reporter_location: Coordinate,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub is_indoor: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ReportResponse {
    area_id: Uuid,
    verification_count: i32,
    /// This report pushed the area over the verification threshold.
    auto_verified: bool,
    created_new_area: bool,
    points_awarded: i64,
}

/// POST /api/v1/reports: merge into a nearby area or register a new one.
///
/// Responds `201` when a new area was created and `200` when the report was
/// merged into an existing one.
pub(super) async fn submit_area_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<Session>,
    Json(body): Json<SubmitReportRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReportResponse>>), ApiError> {
    let submission = agit_db::ReportSubmission {
        reporter_location: body.reporter_location,
        location: body.location,
        form: ReportForm {
            name: body.name,
            address: body.address,
            is_indoor: body.is_indoor,
        },
    };

    let outcome = agit_db::submit_report(
        &state.pool,
        session.user_id(),
        submission,
        state.config.dedup_radius_m,
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(
        area_id = %outcome.area_id,
        verification_count = outcome.verification_count,
        created_new_area = outcome.created_new_area,
        auto_verified = outcome.auto_verified,
        "report accepted"
    );

    let status = if outcome.created_new_area {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(ApiResponse::new(
            ReportResponse {
                area_id: outcome.area_id,
                verification_count: outcome.verification_count,
                auto_verified: outcome.auto_verified,
                created_new_area: outcome.created_new_area,
                points_awarded: outcome.points_awarded,
            },
            req_id.0,
        )),
    ))
}
