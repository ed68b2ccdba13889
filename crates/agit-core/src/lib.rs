pub mod app_config;
pub mod config;
pub mod geo;
pub mod gifts;
pub mod models;
pub mod public_data;
pub mod rank;
pub mod session;
pub mod trust;
pub mod verification;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{haversine_meters, Coordinate, EARTH_RADIUS_M};
pub use gifts::{find_gift, Gift, GIFT_CATALOG};
pub use models::{Area, Review};
pub use public_data::{
    load_public_sources, parse_public_csv, ColumnMapping, ParsedCsv, PublicAreaRecord,
    PublicDataError, PublicSourcesFile, RowRejection, SourceMapping,
};
pub use rank::{lookup_rank, next_rank, progress_to_next, Rank, RANK_TABLE};
pub use session::{validate_nickname, Identity, Session, SessionProfile};
pub use trust::{compute_trust, TrustBand, TrustBasis, TrustScore};
pub use verification::{
    apply_report, check_report_distance, ReportForm, VerificationState, DEFAULT_DEDUP_RADIUS_M,
    MAX_DEDUP_RADIUS_M, MAX_REPORT_DISTANCE_M, MIN_DEDUP_RADIUS_M,
    PUBLIC_DATA_VERIFICATION_COUNT, REPORT_BONUS_POINTS, VERIFICATION_THRESHOLD,
};

use thiserror::Error;

/// Errors raised while loading configuration or static data files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}

/// Input that fails a domain rule before anything is written.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("report location is {distance_m:.0}m away from the reporter; reports must be within {limit_m:.0}m")]
    OutOfRange { distance_m: f64, limit_m: f64 },

    #[error("cleanliness must be between 1 and 5, got {0}")]
    Cleanliness(i16),

    #[error("nickname must be 2-20 characters")]
    Nickname,

    #[error("comment must be at most {max} characters")]
    CommentTooLong { max: usize },

    #[error("not enough points: have {available}, need {required}")]
    InsufficientPoints { available: i64, required: i64 },
}
