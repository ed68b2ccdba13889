//! Integration tests for `KakaoGeocoder` using wiremock HTTP mocks.

use agit_core::{Coordinate, PublicAreaRecord};
use agit_geocoder::{backfill_coordinates, GeocodeError, GeocoderConfig, KakaoGeocoder};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ADDRESS_PATH: &str = "/v2/local/search/address.json";
const REVERSE_PATH: &str = "/v2/local/geo/coord2address.json";

fn config(base_url: &str) -> GeocoderConfig {
    GeocoderConfig {
        api_key: "test-key".to_string(),
        timeout_secs: 5,
        base_url: base_url.to_string(),
    }
}

fn city_hall_body() -> serde_json::Value {
    serde_json::json!({
        "meta": { "total_count": 1 },
        "documents": [
            {
                "address_name": "서울 중구 세종대로 110",
                "x": "126.977829174031",
                "y": "37.5663174209601"
            }
        ]
    })
}

/// Mount a permissive address-search mock so `initialize` succeeds.
async fn ready_geocoder(server: &MockServer) -> KakaoGeocoder {
    Mock::given(method("GET"))
        .and(path(ADDRESS_PATH))
        .and(header("authorization", "KakaoAK test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(city_hall_body()))
        .mount(server)
        .await;

    KakaoGeocoder::initialize(config(&server.uri()))
        .await
        .expect("initialize should succeed")
}

#[tokio::test]
async fn initialize_rejects_bad_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ADDRESS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "errorType": "AccessDeniedError",
            "message": "wrong appKey"
        })))
        .mount(&server)
        .await;

    let result = KakaoGeocoder::initialize(config(&server.uri())).await;
    assert!(matches!(result, Err(GeocodeError::Unauthorized)));
}

#[tokio::test]
async fn initialize_accepts_empty_probe_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ADDRESS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "documents": [] })),
        )
        .mount(&server)
        .await;

    assert!(KakaoGeocoder::initialize(config(&server.uri())).await.is_ok());
}

#[tokio::test]
async fn initialize_surfaces_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ADDRESS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = KakaoGeocoder::initialize(config(&server.uri())).await;
    assert!(matches!(result, Err(GeocodeError::Http(_))));
}

#[tokio::test]
async fn geocode_address_returns_first_document() {
    let server = MockServer::start().await;
    let geocoder = ready_geocoder(&server).await;

    let result = geocoder
        .geocode_address("세종대로 110")
        .await
        .expect("should geocode");

    assert_eq!(result.address, "서울 중구 세종대로 110");
    assert!((result.coordinate.latitude - 37.566_317).abs() < 1e-5);
    assert!((result.coordinate.longitude - 126.977_829).abs() < 1e-5);
}

#[tokio::test]
async fn geocode_address_without_documents_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ADDRESS_PATH))
        .and(query_param("query", "nowhere"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "documents": [] })),
        )
        .mount(&server)
        .await;
    let geocoder = ready_geocoder(&server).await;

    let err = geocoder.geocode_address("nowhere").await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[tokio::test]
async fn geocode_blank_query_is_not_found_without_request() {
    let server = MockServer::start().await;
    let geocoder = ready_geocoder(&server).await;

    let err = geocoder.geocode_address("   ").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn geocode_address_with_bad_coordinates_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ADDRESS_PATH))
        .and(query_param("query", "broken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "documents": [{ "address_name": "x", "x": "east", "y": "37.5" }]
        })))
        .mount(&server)
        .await;
    let geocoder = ready_geocoder(&server).await;

    let err = geocoder.geocode_address("broken").await.unwrap_err();
    assert!(matches!(err, GeocodeError::InvalidResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn reverse_geocode_prefers_road_address() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REVERSE_PATH))
        .and(query_param("x", "126.978"))
        .and(query_param("y", "37.5665"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "documents": [{
                "road_address": { "address_name": "서울 중구 세종대로 110" },
                "address": { "address_name": "서울 중구 태평로1가 31" }
            }]
        })))
        .mount(&server)
        .await;
    let geocoder = ready_geocoder(&server).await;

    let address = geocoder
        .reverse_geocode(Coordinate::new(37.5665, 126.978))
        .await
        .unwrap();
    assert_eq!(address, "서울 중구 세종대로 110");
}

#[tokio::test]
async fn reverse_geocode_falls_back_to_lot_address() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REVERSE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "documents": [{
                "road_address": null,
                "address": { "address_name": "서울 중구 태평로1가 31" }
            }]
        })))
        .mount(&server)
        .await;
    let geocoder = ready_geocoder(&server).await;

    let address = geocoder
        .reverse_geocode(Coordinate::new(37.5665, 126.978))
        .await
        .unwrap();
    assert_eq!(address, "서울 중구 태평로1가 31");
}

#[tokio::test]
async fn reverse_geocode_at_sea_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REVERSE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "documents": [] })),
        )
        .mount(&server)
        .await;
    let geocoder = ready_geocoder(&server).await;

    let err = geocoder
        .reverse_geocode(Coordinate::new(35.0, 125.0))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

fn record(line: usize, address: &str, coordinate: Option<Coordinate>) -> PublicAreaRecord {
    PublicAreaRecord {
        line,
        name: "흡연구역".to_string(),
        address: address.to_string(),
        coordinate,
        is_indoor: false,
    }
}

#[tokio::test]
async fn backfill_resolves_missing_coordinates_and_reports_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ADDRESS_PATH))
        .and(query_param("query", "없는 주소"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "documents": [] })),
        )
        .mount(&server)
        .await;
    let geocoder = ready_geocoder(&server).await;

    let known = Coordinate::new(37.48, 126.95);
    let result = backfill_coordinates(
        &geocoder,
        vec![
            record(4, "없는 주소", None),
            record(2, "관악구 관악로 1", Some(known)),
            record(3, "세종대로 110", None),
        ],
        2,
    )
    .await;

    let lines: Vec<usize> = result.records.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![2, 3]);
    assert_eq!(result.records[0].coordinate, Some(known));
    let filled = result.records[1].coordinate.expect("geocoded");
    assert!((filled.latitude - 37.566_317).abs() < 1e-5);

    assert_eq!(result.rejected.len(), 1);
    assert_eq!(result.rejected[0].line, 4);
}
