//! Bulk insert of government open-data areas.

use agit_core::verification::VerificationState;
use agit_core::{PublicAreaRecord, RowRejection};
use sqlx::PgPool;

use crate::areas::{insert_area, public_area_exists_at, NewArea};
use crate::DbError;

/// Per-file import tally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    /// A public-data area already exists at exactly the same coordinate.
    pub duplicates: usize,
    /// Rows that reached the store without a coordinate.
    pub missing_coordinates: usize,
    /// Rows whose insert failed; the rest of the batch still runs.
    pub failed: Vec<RowRejection>,
}

impl ImportSummary {
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.duplicates + self.missing_coordinates + self.failed.len()
    }
}

/// Insert `records` as verified public-data areas tagged with `source_label`.
///
/// Rows without a coordinate and exact-coordinate duplicates of existing
/// public-data areas are skipped. Insert failures are collected per row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] only if the duplicate lookup fails; per-row
/// insert failures land in [`ImportSummary::failed`].
pub async fn import_public_areas(
    pool: &PgPool,
    source_label: &str,
    records: &[PublicAreaRecord],
) -> Result<ImportSummary, DbError> {
    let mut summary = ImportSummary::default();

    for record in records {
        let Some(coordinate) = record.coordinate else {
            summary.missing_coordinates += 1;
            continue;
        };

        if public_area_exists_at(pool, coordinate).await? {
            summary.duplicates += 1;
            continue;
        }

        let area = NewArea {
            name: record.name.clone(),
            address: record.address.clone(),
            coordinate,
            is_indoor: record.is_indoor,
            state: VerificationState::public_data(),
            public_data_source: Some(source_label.to_string()),
        };
        match insert_area(pool, &area).await {
            Ok(_) => summary.inserted += 1,
            Err(e) => summary.failed.push(RowRejection {
                line: record.line,
                reason: e.to_string(),
            }),
        }
    }

    Ok(summary)
}
