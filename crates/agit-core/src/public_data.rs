//! Government open-data CSV exports: per-source column mappings and typed
//! row parsing.
//!
//! Each district publishes its own layout, so the columns to read are
//! configured in `config/public_sources.yaml` and selected by file name.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::Coordinate;
use crate::ConfigError;

/// Substring of the indoor/outdoor column that marks an indoor facility.
const INDOOR_MARKER: &str = "실내";

#[derive(Debug, Error)]
pub enum PublicDataError {
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV header is missing configured column '{0}'")]
    MissingColumn(String),
}

/// Header names to read for each field. Coordinate columns are optional;
/// sources without them need geocoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub name: String,
    pub address: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub indoor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMapping {
    pub id: String,
    /// Provenance label stored on imported areas.
    pub label: String,
    /// Every pattern must appear in the file name for this mapping to apply.
    #[serde(default)]
    pub file_patterns: Vec<String>,
    pub columns: ColumnMapping,
}

impl SourceMapping {
    /// Id given to one-off mappings built at upload time.
    pub const CUSTOM_ID: &'static str = "custom";

    /// A one-off mapping supplied with an upload instead of the YAML table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] under the same rules applied to
    /// configured sources.
    pub fn custom(label: &str, columns: ColumnMapping) -> Result<Self, ConfigError> {
        let mapping = Self {
            id: Self::CUSTOM_ID.to_string(),
            label: label.trim().to_string(),
            file_patterns: Vec::new(),
            columns,
        };
        validate_mapping(&mapping)?;
        Ok(mapping)
    }

    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        !self.file_patterns.is_empty()
            && self
                .file_patterns
                .iter()
                .all(|pattern| file_name.contains(pattern.as_str()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicSourcesFile {
    /// Name given to rows whose name cell is blank.
    pub default_name: String,
    /// Checked in order; the first match wins.
    pub sources: Vec<SourceMapping>,
    /// Used when no source matches the file name.
    pub fallback: SourceMapping,
}

impl PublicSourcesFile {
    #[must_use]
    pub fn mapping_for(&self, file_name: &str) -> &SourceMapping {
        self.sources
            .iter()
            .find(|s| s.matches(file_name))
            .unwrap_or(&self.fallback)
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&SourceMapping> {
        self.sources
            .iter()
            .chain(std::iter::once(&self.fallback))
            .find(|s| s.id == id)
    }
}

/// Load and validate the public-data source mappings from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_public_sources(path: &Path) -> Result<PublicSourcesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: PublicSourcesFile = serde_yaml::from_str(&content)?;
    validate_sources(&file)?;
    Ok(file)
}

fn validate_sources(file: &PublicSourcesFile) -> Result<(), ConfigError> {
    if file.default_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "default_name must be non-empty".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for source in file.sources.iter().chain(std::iter::once(&file.fallback)) {
        validate_mapping(source)?;
        if !seen_ids.insert(source.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source id: '{}'",
                source.id
            )));
        }
    }

    for source in &file.sources {
        if source.file_patterns.is_empty() {
            return Err(ConfigError::Validation(format!(
                "source '{}' needs at least one file pattern",
                source.id
            )));
        }
    }

    Ok(())
}

fn validate_mapping(source: &SourceMapping) -> Result<(), ConfigError> {
    if source.id.trim().is_empty() || source.label.trim().is_empty() {
        return Err(ConfigError::Validation(
            "source id and label must be non-empty".to_string(),
        ));
    }
    let cols = &source.columns;
    if cols.name.trim().is_empty() || cols.address.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "source '{}' must name its name and address columns",
            source.id
        )));
    }
    if cols.latitude.is_some() != cols.longitude.is_some() {
        return Err(ConfigError::Validation(format!(
            "source '{}' must configure both latitude and longitude or neither",
            source.id
        )));
    }
    Ok(())
}

/// One usable CSV row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicAreaRecord {
    /// 1-based line number in the file, header included.
    pub line: usize,
    pub name: String,
    pub address: String,
    /// `None` when the row has no coordinates and must be geocoded.
    pub coordinate: Option<Coordinate>,
    pub is_indoor: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedCsv {
    pub records: Vec<PublicAreaRecord>,
    pub rejected: Vec<RowRejection>,
    /// Configured optional columns the header did not carry; read as blank.
    pub missing_columns: Vec<String>,
}

/// Parse a CSV export with the given column mapping.
///
/// A leading byte-order mark is ignored and the delimiter (`,` or `;`) is
/// picked from the header line. Blank or zero coordinates mean "unknown";
/// malformed or out-of-range coordinates reject the row. Configured columns
/// other than the name that the header lacks read as blank cells and are
/// listed in [`ParsedCsv::missing_columns`].
///
/// # Errors
///
/// Returns [`PublicDataError::MissingColumn`] when the name column is absent
/// from the header, or [`PublicDataError::Csv`] if the header cannot be read.
pub fn parse_public_csv(
    content: &str,
    columns: &ColumnMapping,
    default_name: &str,
) -> Result<ParsedCsv, PublicDataError> {
    let content = content.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(content))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let position = |column: &str| headers.iter().position(|h| h == column);

    let name_idx = position(&columns.name)
        .ok_or_else(|| PublicDataError::MissingColumn(columns.name.clone()))?;

    let mut parsed = ParsedCsv::default();
    let mut lenient_index = |column: Option<&String>| {
        let column = column?;
        let idx = position(column);
        if idx.is_none() {
            parsed.missing_columns.push(column.clone());
        }
        idx
    };
    let address_idx = lenient_index(Some(&columns.address));
    let lat_idx = lenient_index(columns.latitude.as_ref());
    let lng_idx = lenient_index(columns.longitude.as_ref());
    let indoor_idx = lenient_index(columns.indoor.as_ref());
    for (i, result) in reader.records().enumerate() {
        let fallback_line = i + 2;
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                parsed.rejected.push(RowRejection {
                    line: fallback_line,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if row.iter().all(str::is_empty) {
            continue;
        }
        // Blank lines are skipped by the reader, so prefer its own line count.
        let line = row
            .position()
            .and_then(|p| usize::try_from(p.line()).ok())
            .unwrap_or(fallback_line);

        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("");

        let coordinate = match (lat_idx, lng_idx) {
            (Some(_), Some(_)) => match parse_coordinate(cell(lat_idx), cell(lng_idx)) {
                Ok(coordinate) => coordinate,
                Err(reason) => {
                    parsed.rejected.push(RowRejection { line, reason });
                    continue;
                }
            },
            _ => None,
        };

        let name = match cell(Some(name_idx)) {
            "" => default_name.to_string(),
            name => name.to_string(),
        };
        let address = cell(address_idx).to_string();

        if coordinate.is_none() && address.is_empty() {
            parsed.rejected.push(RowRejection {
                line,
                reason: "row has neither coordinates nor an address".to_string(),
            });
            continue;
        }

        parsed.records.push(PublicAreaRecord {
            line,
            name,
            address,
            coordinate,
            is_indoor: cell(indoor_idx).contains(INDOOR_MARKER),
        });
    }

    Ok(parsed)
}

fn detect_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or("");
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}

fn parse_coordinate(lat: &str, lng: &str) -> Result<Option<Coordinate>, String> {
    if lat.is_empty() || lng.is_empty() {
        return Ok(None);
    }
    let latitude: f64 = lat
        .parse()
        .map_err(|_| format!("latitude '{lat}' is not a number"))?;
    let longitude: f64 = lng
        .parse()
        .map_err(|_| format!("longitude '{lng}' is not a number"))?;
    if latitude == 0.0 || longitude == 0.0 {
        return Ok(None);
    }
    Coordinate::new(latitude, longitude)
        .validate()
        .map(Some)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "public_data_test.rs"]
mod tests;
