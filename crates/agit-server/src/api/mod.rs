mod admin;
mod areas;
mod favorites;
mod geocode;
mod gifts;
mod profile;
mod reports;
mod reviews;

use std::sync::Arc;

use agit_core::{AppConfig, PublicSourcesFile, Session};
use agit_geocoder::{GeocodeError, KakaoGeocoder};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::middleware::{
    enforce_rate_limit, request_id, require_admin, resolve_session, RateLimitState, RequestId,
    USER_EMAIL_HEADER, USER_ID_HEADER, USER_NAME_HEADER,
};

/// Upper bound for CSV uploads on the admin import route.
const IMPORT_BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    /// `None` when no REST key is configured or the startup probe failed.
    pub geocoder: Option<Arc<KakaoGeocoder>>,
    pub public_sources: Arc<PublicSourcesFile>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
    geocoder: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" | "geocode_not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "geocode_failed" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &agit_db::DbError) -> ApiError {
    use agit_db::DbError;

    match error {
        DbError::Validation(e) => ApiError::new(request_id, "validation_error", e.to_string()),
        DbError::NotFound => ApiError::new(request_id, "not_found", "resource not found"),
        DbError::Conflict(reason) => ApiError::new(request_id, "conflict", reason.clone()),
        DbError::Sqlx(_) | DbError::Migration(_) => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

pub(super) fn map_geocode_error(request_id: String, error: &GeocodeError) -> ApiError {
    if error.is_not_found() {
        return ApiError::new(request_id, "geocode_not_found", error.to_string());
    }
    tracing::warn!(error = %error, "geocoding request failed");
    ApiError::new(request_id, "geocode_failed", "geocoding service unavailable")
}

/// The signed-in caller's id, or `unauthorized`.
pub(super) fn require_user(request_id: &str, session: &Session) -> Result<Uuid, ApiError> {
    match session.profile() {
        Some(profile) => Ok(profile.id),
        None => Err(ApiError::new(request_id, "unauthorized", "sign in required")),
    }
}

pub(super) fn require_geocoder<'a>(
    request_id: &str,
    state: &'a AppState,
) -> Result<&'a KakaoGeocoder, ApiError> {
    state.geocoder.as_deref().ok_or_else(|| {
        ApiError::new(
            request_id,
            "geocode_failed",
            "geocoding is not configured on this server",
        )
    })
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(USER_EMAIL_HEADER),
            HeaderName::from_static(USER_NAME_HEADER),
        ])
}

fn admin_router(config: Arc<AppConfig>) -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/import", post(admin::import_public_data))
        .route_layer(axum::middleware::from_fn_with_state(config, require_admin))
        .layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT_BYTES))
}

fn api_router(state: &AppState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/areas", get(areas::list_areas))
        .route("/api/v1/areas/{area_id}", get(areas::get_area_detail))
        .route(
            "/api/v1/areas/{area_id}/reviews",
            get(reviews::list_area_reviews).post(reviews::create_area_review),
        )
        .route(
            "/api/v1/areas/{area_id}/favorite",
            post(favorites::toggle_area_favorite),
        )
        .route("/api/v1/reports", post(reports::submit_area_report))
        .route(
            "/api/v1/me",
            get(profile::get_me)
                .patch(profile::update_me)
                .delete(profile::delete_me),
        )
        .route("/api/v1/me/favorites", get(favorites::list_my_favorites))
        .route("/api/v1/me/gifts", get(gifts::list_my_exchanges))
        .route("/api/v1/gifts", get(gifts::list_catalog))
        .route("/api/v1/gifts/{gift_id}/redeem", post(gifts::redeem))
        .route("/api/v1/geocode", get(geocode::forward))
        .route("/api/v1/geocode/reverse", get(geocode::reverse))
        .merge(admin_router(Arc::clone(&state.config)))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    state.pool.clone(),
                    resolve_session,
                )),
        )
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(api_router(&state, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let geocoder = if state.geocoder.is_some() {
        "ok"
    } else {
        "disabled"
    };

    match agit_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::new(
                HealthData {
                    status: "ok",
                    database: "ok",
                    geocoder,
                },
                req_id.0,
            )),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::new(
                    HealthData {
                        status: "degraded",
                        database: "unavailable",
                        geocoder,
                    },
                    req_id.0,
                )),
            )
        }
    }
}
