//! Offline unit tests for agit-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use agit_core::{AppConfig, Environment, RowRejection};
use agit_db::{AreaRow, ImportSummary, PoolConfig, ProfileRow};
use chrono::Utc;
use uuid::Uuid;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        admin_email: None,
        dedup_radius_m: 50.0,
        public_sources_path: PathBuf::from("./config/public_sources.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        kakao_rest_api_key: None,
        geocoder_timeout_secs: 10,
        rate_limit_per_minute: 120,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn area_row_converts_into_domain_area() {
    let id = Uuid::new_v4();
    let row = AreaRow {
        id,
        name: "Exit 7".to_string(),
        address: "Gangnam-daero 396".to_string(),
        latitude: 37.4979,
        longitude: 127.0276,
        is_indoor: false,
        verification_count: 3,
        is_verified: true,
        is_public_data: false,
        public_data_source: None,
        public_data_updated_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let area = row.into_area();
    assert_eq!(area.id, id);
    assert!((area.coordinate.latitude - 37.4979).abs() < f64::EPSILON);
    assert!((area.coordinate.longitude - 127.0276).abs() < f64::EPSILON);
    assert!(area.is_verified);
}

#[test]
fn profile_row_projects_session_profile() {
    let row = ProfileRow {
        id: Uuid::new_v4(),
        email: Some("hop@example.com".to_string()),
        nickname: "hopper".to_string(),
        points: 350,
        rank: "탐험 토끼".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let session = row.to_session_profile();
    assert_eq!(session.id, row.id);
    assert_eq!(session.points, 350);
    assert_eq!(session.rank, "탐험 토끼");
}

#[test]
fn import_summary_skipped_counts_every_non_insert() {
    let summary = ImportSummary {
        inserted: 4,
        duplicates: 2,
        missing_coordinates: 1,
        failed: vec![RowRejection {
            line: 9,
            reason: "boom".to_string(),
        }],
    };
    assert_eq!(summary.skipped(), 4);
}
