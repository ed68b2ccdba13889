//! HTTP client for the Kakao Local REST API.
//!
//! The client is built and probed once through [`KakaoGeocoder::initialize`];
//! callers hold the returned value (typically behind an `Arc`) instead of
//! reaching for a global.

use std::time::Duration;

use agit_core::{AppConfig, Coordinate};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::GeocodeError;
use crate::types::{AddressSearchResponse, CoordToAddressResponse, GeocodedAddress};

const DEFAULT_BASE_URL: &str = "https://dapi.kakao.com/";
const ADDRESS_SEARCH_PATH: &str = "v2/local/search/address.json";
const COORD_TO_ADDRESS_PATH: &str = "v2/local/geo/coord2address.json";

/// Address used to check the key at startup.
const PROBE_QUERY: &str = "서울특별시 중구 세종대로 110";

#[derive(Clone)]
pub struct GeocoderConfig {
    pub api_key: String,
    pub timeout_secs: u64,
    pub base_url: String,
}

impl GeocoderConfig {
    /// Geocoder settings from the app config, or `None` when no REST key is set.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Option<Self> {
        config.kakao_rest_api_key.as_ref().map(|key| Self {
            api_key: key.clone(),
            timeout_secs: config.geocoder_timeout_secs,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }
}

impl std::fmt::Debug for GeocoderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocoderConfig")
            .field("api_key", &"[redacted]")
            .field("timeout_secs", &self.timeout_secs)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Ready-to-use geocoder. Only obtainable through [`KakaoGeocoder::initialize`].
pub struct KakaoGeocoder {
    client: Client,
    auth_header: String,
    base_url: Url,
}

impl KakaoGeocoder {
    /// Build the HTTP client and verify the key with one probe request.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::InvalidConfig`] if `base_url` is not a valid URL.
    /// - [`GeocodeError::Unauthorized`] if the API rejects the key.
    /// - [`GeocodeError::Http`] if the client cannot be built or the probe fails.
    pub async fn initialize(config: GeocoderConfig) -> Result<Self, GeocodeError> {
        let geocoder = Self::build(&config)?;
        match geocoder.search_address(PROBE_QUERY).await {
            // An empty result still proves the key works.
            Ok(_) | Err(GeocodeError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        tracing::debug!(base_url = %geocoder.base_url, "geocoder initialized");
        Ok(geocoder)
    }

    fn build(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("bunny-agit/0.1 (smoking-area-map)")
            .build()?;

        // One trailing slash so joined paths append rather than replace.
        let normalised = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            GeocodeError::InvalidConfig(format!("invalid base URL '{}': {e}", config.base_url))
        })?;

        Ok(Self {
            client,
            auth_header: format!("KakaoAK {}", config.api_key),
            base_url,
        })
    }

    /// Resolve free-text address to its best match.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::NotFound`] when the API returns no documents.
    /// - [`GeocodeError::Unauthorized`] if the key is rejected.
    /// - [`GeocodeError::Http`] on network failure or non-2xx status.
    /// - [`GeocodeError::Deserialize`] / [`GeocodeError::InvalidResponse`]
    ///   for an unexpected body.
    pub async fn geocode_address(&self, query: &str) -> Result<GeocodedAddress, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::NotFound("an empty query".to_string()));
        }
        self.search_address(query).await
    }

    /// Address at `coordinate`, preferring the road-name form.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::NotFound`] when nothing is registered at the point.
    /// - [`GeocodeError::Unauthorized`] if the key is rejected.
    /// - [`GeocodeError::Http`] on network failure or non-2xx status.
    /// - [`GeocodeError::Deserialize`] for an unexpected body.
    pub async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<String, GeocodeError> {
        let url = self.build_url(
            COORD_TO_ADDRESS_PATH,
            &[
                ("x", &coordinate.longitude.to_string()),
                ("y", &coordinate.latitude.to_string()),
            ],
        )?;
        let body: CoordToAddressResponse = self.request_json(&url).await?;

        body.documents
            .into_iter()
            .find_map(crate::types::CoordDocument::best_name)
            .ok_or_else(|| {
                GeocodeError::NotFound(format!(
                    "({}, {})",
                    coordinate.latitude, coordinate.longitude
                ))
            })
    }

    async fn search_address(&self, query: &str) -> Result<GeocodedAddress, GeocodeError> {
        let url = self.build_url(ADDRESS_SEARCH_PATH, &[("query", query)])?;
        let body: AddressSearchResponse = self.request_json(&url).await?;

        let first = body
            .documents
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound(format!("'{query}'")))?;

        let longitude = parse_degrees(&first.x, "x")?;
        let latitude = parse_degrees(&first.y, "y")?;
        let coordinate = Coordinate::new(latitude, longitude)
            .validate()
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

        Ok(GeocodedAddress {
            address: first.address_name,
            coordinate,
        })
    }

    /// Join `path` onto the base URL and append percent-encoded query pairs.
    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, GeocodeError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| GeocodeError::InvalidConfig(format!("cannot join '{path}': {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Send an authorized GET and decode the JSON body.
    async fn request_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, GeocodeError> {
        tracing::debug!(path = url.path(), "geocoder request");
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(GeocodeError::Unauthorized);
        }

        let body = response.error_for_status()?.text().await?;
        serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
            context: url.path().to_string(),
            source: e,
        })
    }
}

fn parse_degrees(raw: &str, field: &str) -> Result<f64, GeocodeError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| GeocodeError::InvalidResponse(format!("{field} '{raw}' is not a number")))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
