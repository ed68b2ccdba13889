//! `import` and `sources` command handlers.

use std::path::{Path, PathBuf};

use agit_core::{parse_public_csv, AppConfig, PublicSourcesFile, SourceMapping};
use agit_geocoder::{backfill_coordinates, GeocoderConfig, KakaoGeocoder};
use anyhow::Context;
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub(crate) struct ImportOptions {
    pub source: Option<String>,
    pub dry_run: bool,
    pub geocode: bool,
    pub concurrency: usize,
}

/// Per-run totals printed at the end.
#[derive(Debug, Default)]
struct ImportTotals {
    files: usize,
    failed_files: usize,
    parsed: usize,
    inserted: usize,
    skipped: usize,
    rejected: usize,
}

/// Pick the column mapping for one file: an explicit source id wins,
/// otherwise the file name is matched against each source's patterns.
fn select_mapping<'a>(
    sources: &'a PublicSourcesFile,
    source: Option<&str>,
    file: &Path,
) -> anyhow::Result<&'a SourceMapping> {
    if let Some(id) = source {
        return sources
            .find(id)
            .ok_or_else(|| anyhow::anyhow!("unknown source '{id}'; run `agit-cli sources`"));
    }
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    Ok(sources.mapping_for(file_name))
}

/// Import each CSV file as verified public-data areas.
///
/// Unreadable or malformed files are logged and skipped; a database failure
/// aborts the run. With `dry_run` no pool is needed and nothing is written.
///
/// # Errors
///
/// Returns an error if the source mapping file cannot be loaded, the
/// geocoder cannot be initialised when `--geocode` is set, or a database
/// write fails.
pub(crate) async fn run_import(
    pool: Option<&PgPool>,
    config: &AppConfig,
    files: &[PathBuf],
    options: &ImportOptions,
) -> anyhow::Result<()> {
    let sources = agit_core::load_public_sources(&config.public_sources_path)
        .with_context(|| {
            format!(
                "failed to load source mappings from {}",
                config.public_sources_path.display()
            )
        })?;

    let geocoder = if options.geocode {
        let geocoder_config = GeocoderConfig::from_app_config(config).ok_or_else(|| {
            anyhow::anyhow!("KAKAO_REST_API_KEY is not set; cannot use --geocode")
        })?;
        Some(KakaoGeocoder::initialize(geocoder_config).await?)
    } else {
        None
    };

    let mut totals = ImportTotals::default();
    for file in files {
        totals.files += 1;
        let mapping = select_mapping(&sources, options.source.as_deref(), file)?;

        let content = match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "skipping unreadable file");
                totals.failed_files += 1;
                continue;
            }
        };
        let parsed = match parse_public_csv(&content, &mapping.columns, &sources.default_name) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(
                    file = %file.display(),
                    source = %mapping.id,
                    error = %e,
                    "skipping malformed file"
                );
                totals.failed_files += 1;
                continue;
            }
        };

        if !parsed.missing_columns.is_empty() {
            tracing::warn!(
                file = %file.display(),
                source = %mapping.id,
                columns = ?parsed.missing_columns,
                "configured columns absent from header; read as blank"
            );
        }

        let mut rejected = parsed.rejected;
        let records = match &geocoder {
            Some(geocoder) => {
                let backfilled =
                    backfill_coordinates(geocoder, parsed.records, options.concurrency).await;
                rejected.extend(backfilled.rejected);
                backfilled.records
            }
            None => parsed.records,
        };
        totals.parsed += records.len();

        for rejection in &rejected {
            tracing::warn!(
                file = %file.display(),
                line = rejection.line,
                reason = %rejection.reason,
                "row rejected"
            );
        }
        totals.rejected += rejected.len();

        let Some(pool) = pool.filter(|_| !options.dry_run) else {
            let with_coordinates = records.iter().filter(|r| r.coordinate.is_some()).count();
            println!(
                "dry-run: {} [{}]: {} rows, {with_coordinates} with coordinates, {} rejected",
                file.display(),
                mapping.id,
                records.len(),
                rejected.len()
            );
            continue;
        };

        let summary = agit_db::import_public_areas(pool, &mapping.label, &records).await?;
        for failure in &summary.failed {
            tracing::warn!(
                file = %file.display(),
                line = failure.line,
                reason = %failure.reason,
                "insert failed"
            );
        }
        totals.inserted += summary.inserted;
        totals.skipped += summary.skipped();
        println!(
            "{} [{}]: inserted {}, duplicates {}, without coordinates {}, failed {}",
            file.display(),
            mapping.id,
            summary.inserted,
            summary.duplicates,
            summary.missing_coordinates,
            summary.failed.len()
        );
    }

    tracing::info!(
        files = totals.files,
        failed_files = totals.failed_files,
        parsed = totals.parsed,
        inserted = totals.inserted,
        skipped = totals.skipped,
        rejected = totals.rejected,
        "import finished"
    );
    println!(
        "import finished: {} files ({} failed), {} rows, {} inserted, {} skipped, {} rejected",
        totals.files,
        totals.failed_files,
        totals.parsed,
        totals.inserted,
        totals.skipped,
        totals.rejected
    );
    Ok(())
}

/// Print the configured source table.
///
/// # Errors
///
/// Returns an error if the source mapping file cannot be loaded.
pub(crate) fn run_sources(config: &AppConfig) -> anyhow::Result<()> {
    let sources = agit_core::load_public_sources(&config.public_sources_path)?;
    for source in &sources.sources {
        println!(
            "{:<16} {:<12} patterns: {}",
            source.id,
            source.label,
            source.file_patterns.join(" + ")
        );
    }
    println!(
        "{:<16} {:<12} (fallback)",
        sources.fallback.id, sources.fallback.label
    );
    Ok(())
}
