//! Fill in coordinates for public-data rows that only carry an address.

use agit_core::{PublicAreaRecord, RowRejection};
use futures::stream::{self, StreamExt};

use crate::client::KakaoGeocoder;

/// Records after backfilling, in their original line order.
#[derive(Debug, Default)]
pub struct Backfilled {
    pub records: Vec<PublicAreaRecord>,
    /// Rows whose address could not be resolved.
    pub rejected: Vec<RowRejection>,
}

/// Geocode every record without a coordinate, at most `concurrency` at a time.
///
/// Records that already have a coordinate pass through untouched. A failed
/// lookup drops the record into [`Backfilled::rejected`] and the rest of the
/// batch continues.
pub async fn backfill_coordinates(
    geocoder: &KakaoGeocoder,
    records: Vec<PublicAreaRecord>,
    concurrency: usize,
) -> Backfilled {
    let (mut ready, missing): (Vec<_>, Vec<_>) =
        records.into_iter().partition(|r| r.coordinate.is_some());

    if missing.is_empty() {
        return Backfilled {
            records: ready,
            rejected: Vec::new(),
        };
    }
    tracing::info!(count = missing.len(), "geocoding rows without coordinates");

    let lookups = stream::iter(missing.into_iter().map(|record| async move {
        let result = geocoder.geocode_address(&record.address).await;
        (record, result)
    }))
    .buffer_unordered(concurrency.max(1))
    .collect::<Vec<_>>()
    .await;

    let mut rejected = Vec::new();
    for (mut record, result) in lookups {
        match result {
            Ok(found) => {
                record.coordinate = Some(found.coordinate);
                ready.push(record);
            }
            Err(e) => {
                tracing::warn!(
                    line = record.line,
                    address = %record.address,
                    error = %e,
                    "geocoding failed"
                );
                rejected.push(RowRejection {
                    line: record.line,
                    reason: format!("could not geocode '{}': {e}", record.address),
                });
            }
        }
    }

    ready.sort_by_key(|r| r.line);
    rejected.sort_by_key(|r| r.line);
    Backfilled {
        records: ready,
        rejected,
    }
}
