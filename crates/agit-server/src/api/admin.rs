//! Administrator-only public-data import.

use std::borrow::Cow;

use agit_core::{parse_public_csv, ColumnMapping, RowRejection, SourceMapping};
use axum::{
    body::Bytes,
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, require_geocoder, ApiError, ApiResponse, AppState};

/// Concurrent geocoder calls per import.
const GEOCODE_CONCURRENCY: usize = 4;

#[derive(Debug, Deserialize)]
pub(super) struct ImportQuery {
    /// Source id from the mapping table; wins over `file_name`.
    pub source: Option<String>,
    /// Original file name, matched against each source's patterns.
    pub file_name: Option<String>,
    /// Geocode rows that only carry an address.
    #[serde(default)]
    pub geocode: bool,
    /// Per-upload column mapping; when `name_col` is set it wins over both
    /// `source` and `file_name`.
    pub name_col: Option<String>,
    pub address_col: Option<String>,
    pub lat_col: Option<String>,
    pub lng_col: Option<String>,
    pub indoor_col: Option<String>,
    /// Provenance label for a per-upload mapping; defaults to the fallback source's.
    pub label: Option<String>,
}

impl ImportQuery {
    fn custom_mapping(&self, fallback_label: &str) -> Option<Result<SourceMapping, String>> {
        let name = non_blank(self.name_col.as_deref())?;
        let Some(address) = non_blank(self.address_col.as_deref()) else {
            return Some(Err("'address_col' is required with 'name_col'".to_string()));
        };
        let columns = ColumnMapping {
            name,
            address,
            latitude: non_blank(self.lat_col.as_deref()),
            longitude: non_blank(self.lng_col.as_deref()),
            indoor: non_blank(self.indoor_col.as_deref()),
        };
        let label = self.label.as_deref().unwrap_or(fallback_label);
        Some(SourceMapping::custom(label, columns).map_err(|e| e.to_string()))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[derive(Debug, Serialize)]
pub(super) struct ImportResponse {
    source: String,
    parsed: usize,
    inserted: usize,
    duplicates: usize,
    missing_coordinates: usize,
    /// Mapped columns the header did not carry.
    missing_columns: Vec<String>,
    rejected: Vec<RowRejection>,
}

fn select_mapping<'a>(
    state: &'a AppState,
    rid: &str,
    query: &ImportQuery,
) -> Result<Cow<'a, SourceMapping>, ApiError> {
    if let Some(custom) = query.custom_mapping(&state.public_sources.fallback.label) {
        return custom
            .map(Cow::Owned)
            .map_err(|reason| ApiError::new(rid, "validation_error", reason));
    }
    match (&query.source, &query.file_name) {
        (Some(id), _) => state
            .public_sources
            .find(id)
            .map(Cow::Borrowed)
            .ok_or_else(|| {
                ApiError::new(rid, "validation_error", format!("unknown source '{id}'"))
            }),
        (None, Some(file_name)) => Ok(Cow::Borrowed(
            state.public_sources.mapping_for(file_name),
        )),
        (None, None) => Err(ApiError::new(
            rid,
            "validation_error",
            "one of 'name_col', 'source' or 'file_name' is required",
        )),
    }
}

/// POST /api/v1/admin/import: body is the raw UTF-8 CSV export.
pub(super) async fn import_public_data(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> Result<Json<ApiResponse<ImportResponse>>, ApiError> {
    let rid = &req_id.0;
    let mapping = select_mapping(&state, rid, &query)?;
    let content = std::str::from_utf8(&body)
        .map_err(|_| ApiError::new(rid, "validation_error", "CSV body must be UTF-8"))?;

    let parsed = parse_public_csv(
        content,
        &mapping.columns,
        &state.public_sources.default_name,
    )
    .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?;
    let parsed_count = parsed.records.len();
    if !parsed.missing_columns.is_empty() {
        tracing::warn!(
            source = %mapping.id,
            columns = ?parsed.missing_columns,
            "mapped columns absent from header; read as blank"
        );
    }
    let missing_columns = parsed.missing_columns;
    let mut rejected = parsed.rejected;

    let records = if query.geocode {
        let geocoder = require_geocoder(rid, &state)?;
        let backfilled =
            agit_geocoder::backfill_coordinates(geocoder, parsed.records, GEOCODE_CONCURRENCY)
                .await;
        rejected.extend(backfilled.rejected);
        backfilled.records
    } else {
        parsed.records
    };

    let summary = agit_db::import_public_areas(&state.pool, &mapping.label, &records)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(
        source = %mapping.id,
        parsed = parsed_count,
        inserted = summary.inserted,
        skipped = summary.skipped(),
        "public data import finished"
    );

    rejected.extend(summary.failed);
    rejected.sort_by_key(|r| r.line);

    Ok(Json(ApiResponse::new(
        ImportResponse {
            source: mapping.id.clone(),
            parsed: parsed_count,
            inserted: summary.inserted,
            duplicates: summary.duplicates,
            missing_coordinates: summary.missing_coordinates,
            missing_columns,
            rejected,
        },
        req_id.0,
    )))
}
