use super::*;

fn test_geocoder(base_url: &str) -> KakaoGeocoder {
    KakaoGeocoder::build(&GeocoderConfig {
        api_key: "test-key".to_string(),
        timeout_secs: 5,
        base_url: base_url.to_string(),
    })
    .expect("geocoder construction should not fail")
}

#[test]
fn build_url_joins_path_and_encodes_query() {
    let geocoder = test_geocoder("https://dapi.kakao.com");
    let url = geocoder
        .build_url(ADDRESS_SEARCH_PATH, &[("query", "세종대로 110")])
        .unwrap();
    assert!(url
        .as_str()
        .starts_with("https://dapi.kakao.com/v2/local/search/address.json?query="));
    assert!(!url.as_str().contains(' '), "query should be encoded: {url}");
}

#[test]
fn build_url_tolerates_trailing_slash() {
    let geocoder = test_geocoder("https://dapi.kakao.com/");
    let url = geocoder
        .build_url(COORD_TO_ADDRESS_PATH, &[("x", "126.978"), ("y", "37.5665")])
        .unwrap();
    assert_eq!(
        url.as_str(),
        "https://dapi.kakao.com/v2/local/geo/coord2address.json?x=126.978&y=37.5665"
    );
}

#[test]
fn invalid_base_url_is_config_error() {
    let result = KakaoGeocoder::build(&GeocoderConfig {
        api_key: "k".to_string(),
        timeout_secs: 5,
        base_url: "not a url".to_string(),
    });
    assert!(matches!(result, Err(GeocodeError::InvalidConfig(_))));
}

#[test]
fn config_debug_redacts_key() {
    let config = GeocoderConfig {
        api_key: "super-secret".to_string(),
        timeout_secs: 5,
        base_url: DEFAULT_BASE_URL.to_string(),
    };
    assert!(!format!("{config:?}").contains("super-secret"));
}

#[test]
fn parse_degrees_rejects_garbage() {
    assert!((parse_degrees(" 127.5 ", "x").unwrap() - 127.5).abs() < f64::EPSILON);
    assert!(matches!(
        parse_degrees("east", "x"),
        Err(GeocodeError::InvalidResponse(_))
    ));
}
