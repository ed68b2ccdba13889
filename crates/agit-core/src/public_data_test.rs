use std::path::PathBuf;

use super::*;

fn seoul_columns() -> ColumnMapping {
    ColumnMapping {
        name: "시설명".to_string(),
        address: "소재지".to_string(),
        latitude: Some("위도".to_string()),
        longitude: Some("경도".to_string()),
        indoor: Some("실내외구분".to_string()),
    }
}

fn address_only_columns() -> ColumnMapping {
    ColumnMapping {
        name: "시설명".to_string(),
        address: "소재지".to_string(),
        latitude: None,
        longitude: None,
        indoor: None,
    }
}

fn source(id: &str, patterns: &[&str]) -> SourceMapping {
    SourceMapping {
        id: id.to_string(),
        label: format!("{id} office"),
        file_patterns: patterns.iter().map(|p| (*p).to_string()).collect(),
        columns: address_only_columns(),
    }
}

fn sources_file(sources: Vec<SourceMapping>) -> PublicSourcesFile {
    PublicSourcesFile {
        default_name: "흡연구역".to_string(),
        sources,
        fallback: source("seoul", &[]),
    }
}

#[test]
fn parses_rows_with_coordinates_and_indoor_flag() {
    let csv = "시설명,소재지,위도,경도,실내외구분\n\
               역앞,서울 중구 세종대로 110,37.5665,126.9780,실외\n\
               로비,서울 중구 을지로 1,37.5660,126.9820,실내 흡연실\n";
    let parsed = parse_public_csv(csv, &seoul_columns(), "흡연구역").unwrap();

    assert!(parsed.rejected.is_empty(), "{:?}", parsed.rejected);
    assert_eq!(parsed.records.len(), 2);
    let first = &parsed.records[0];
    assert_eq!(first.line, 2);
    assert_eq!(first.name, "역앞");
    assert_eq!(first.coordinate, Some(Coordinate::new(37.5665, 126.9780)));
    assert!(!first.is_indoor);
    assert!(parsed.records[1].is_indoor);
}

#[test]
fn strips_bom_and_detects_semicolon_delimiter() {
    let csv = "\u{feff}시설명;소재지;위도;경도;실내외구분\n역앞;서울 중구;37.5;127.0;실외\n";
    let parsed = parse_public_csv(csv, &seoul_columns(), "흡연구역").unwrap();
    assert_eq!(parsed.records.len(), 1);
    assert_eq!(parsed.records[0].address, "서울 중구");
}

#[test]
fn blank_name_gets_default() {
    let csv = "시설명,소재지,위도,경도,실내외구분\n,서울 중구,37.5,127.0,\n";
    let parsed = parse_public_csv(csv, &seoul_columns(), "흡연구역").unwrap();
    assert_eq!(parsed.records[0].name, "흡연구역");
}

#[test]
fn blank_or_zero_coordinates_need_geocoding() {
    let csv = "시설명,소재지,위도,경도,실내외구분\n\
               a,서울 중구,,,실외\n\
               b,서울 종로구,0,0,실외\n";
    let parsed = parse_public_csv(csv, &seoul_columns(), "흡연구역").unwrap();
    assert_eq!(parsed.records.len(), 2);
    assert!(parsed.records.iter().all(|r| r.coordinate.is_none()));
}

#[test]
fn malformed_coordinates_reject_the_row() {
    let csv = "시설명,소재지,위도,경도,실내외구분\n\
               a,서울 중구,north,127.0,실외\n\
               b,서울 중구,137.5,127.0,실외\n\
               c,서울 중구,37.5,127.0,실외\n";
    let parsed = parse_public_csv(csv, &seoul_columns(), "흡연구역").unwrap();
    assert_eq!(parsed.records.len(), 1);
    assert_eq!(parsed.records[0].line, 4);
    let lines: Vec<usize> = parsed.rejected.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![2, 3]);
}

#[test]
fn row_without_coordinates_or_address_is_rejected() {
    let csv = "시설명,소재지\n빈칸,\n";
    let parsed = parse_public_csv(csv, &address_only_columns(), "흡연구역").unwrap();
    assert!(parsed.records.is_empty());
    assert_eq!(parsed.rejected.len(), 1);
}

#[test]
fn empty_rows_are_ignored() {
    let csv = "시설명,소재지\na,서울\n,\nb,부산\n";
    let parsed = parse_public_csv(csv, &address_only_columns(), "흡연구역").unwrap();
    assert_eq!(parsed.records.len(), 2);
    assert!(parsed.rejected.is_empty());
}

#[test]
fn missing_configured_column_fails_the_file() {
    let csv = "이름,주소\na,b\n";
    let err = parse_public_csv(csv, &address_only_columns(), "흡연구역").unwrap_err();
    assert!(matches!(err, PublicDataError::MissingColumn(ref c) if c == "시설명"));
}

#[test]
fn absent_optional_columns_read_as_blank() {
    let csv = "시설명,소재지,위도,경도\n광장,서울,37.5,127.0\n";
    let parsed = parse_public_csv(csv, &seoul_columns(), "흡연구역").unwrap();

    assert_eq!(parsed.records.len(), 1);
    assert!(!parsed.records[0].is_indoor);
    assert_eq!(parsed.records[0].coordinate, Some(Coordinate::new(37.5, 127.0)));
    assert_eq!(parsed.missing_columns, vec!["실내외구분".to_string()]);
}

#[test]
fn absent_coordinate_columns_leave_rows_for_geocoding() {
    let csv = "시설명,소재지,실내외구분\n역앞,서울 중구,실내\n";
    let parsed = parse_public_csv(csv, &seoul_columns(), "흡연구역").unwrap();

    assert_eq!(parsed.records.len(), 1);
    assert!(parsed.records[0].coordinate.is_none());
    assert!(parsed.records[0].is_indoor);
    assert_eq!(parsed.missing_columns, vec!["위도".to_string(), "경도".to_string()]);
}

#[test]
fn absent_address_column_rejects_rows_without_coordinates() {
    let csv = "시설명,위도,경도\na,37.5,127.0\nb,,\n";
    let parsed = parse_public_csv(csv, &seoul_columns(), "흡연구역").unwrap();

    assert_eq!(parsed.records.len(), 1);
    assert_eq!(parsed.records[0].address, "");
    assert_eq!(parsed.rejected.len(), 1);
    assert_eq!(parsed.rejected[0].line, 3);
}

#[test]
fn record_serializes_with_nested_coordinate() {
    let csv = "시설명,소재지,위도,경도,실내외구분\n역앞,서울 중구,37.5,127.0,실외\n";
    let parsed = parse_public_csv(csv, &seoul_columns(), "흡연구역").unwrap();
    let json = serde_json::to_value(&parsed.records[0]).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "line": 2,
            "name": "역앞",
            "address": "서울 중구",
            "coordinate": { "latitude": 37.5, "longitude": 127.0 },
            "is_indoor": false,
        })
    );
}

#[test]
fn custom_mapping_is_validated() {
    let ok = SourceMapping::custom(
        "강동구청",
        ColumnMapping {
            latitude: Some("Y".to_string()),
            longitude: Some("X".to_string()),
            ..address_only_columns()
        },
    )
    .unwrap();
    assert_eq!(ok.id, "custom");
    assert_eq!(ok.label, "강동구청");

    let half = SourceMapping::custom(
        "강동구청",
        ColumnMapping {
            latitude: Some("Y".to_string()),
            ..address_only_columns()
        },
    )
    .unwrap_err();
    assert!(matches!(half, ConfigError::Validation(_)));

    let blank = SourceMapping::custom(" ", address_only_columns()).unwrap_err();
    assert!(matches!(blank, ConfigError::Validation(_)));
}

#[test]
fn mapping_requires_every_pattern() {
    let data = source("gwangjin-data", &["광진구", "데이터"]);
    assert!(data.matches("서울특별시_광진구_흡연구역_데이터.csv"));
    assert!(!data.matches("서울특별시_광진구_흡연시설.csv"));
    assert!(!source("empty", &[]).matches("anything.csv"));
}

#[test]
fn mapping_for_picks_first_match_then_fallback() {
    let file = sources_file(vec![
        source("gwangjin-data", &["광진구", "데이터"]),
        source("gwangjin", &["광진구"]),
    ]);
    assert_eq!(file.mapping_for("광진구_데이터.csv").id, "gwangjin-data");
    assert_eq!(file.mapping_for("광진구_시설.csv").id, "gwangjin");
    assert_eq!(file.mapping_for("강남구.csv").id, "seoul");
    assert_eq!(file.find("seoul").map(|s| s.label.as_str()), Some("seoul office"));
    assert!(file.find("busan").is_none());
}

#[test]
fn validation_rejects_duplicate_ids() {
    let file = sources_file(vec![source("a", &["x"]), source("a", &["y"])]);
    let err = validate_sources(&file).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate")));
}

#[test]
fn validation_rejects_half_configured_coordinates() {
    let mut broken = source("a", &["x"]);
    broken.columns.latitude = Some("위도".to_string());
    let err = validate_sources(&sources_file(vec![broken])).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn validation_rejects_source_without_patterns() {
    let err = validate_sources(&sources_file(vec![source("a", &[])])).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("file pattern")));
}

#[test]
fn bundled_sources_file_loads() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/public_sources.yaml");
    let file = load_public_sources(&path).expect("bundled mapping should load");
    assert_eq!(file.fallback.id, "seoul");
    assert_eq!(
        file.mapping_for("광진구_흡연구역_데이터.csv").id,
        "gwangjin-data"
    );
    assert_eq!(file.mapping_for("관악구_흡연시설.csv").label, "관악구청");
}

#[test]
fn missing_sources_file_is_io_error() {
    let err = load_public_sources(std::path::Path::new("/nonexistent/sources.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileIo { .. }));
}
