use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use agit_core::{AppConfig, Identity, Session};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-agit-user-id";
pub const USER_EMAIL_HEADER: &str = "x-agit-user-email";
pub const USER_NAME_HEADER: &str = "x-agit-user-name";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter shared by every API route.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }

    #[must_use]
    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

fn reject(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(MiddlewareErrorBody {
            error: MiddlewareError { code, message },
        }),
    )
        .into_response()
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Resolve the caller into a [`Session`] request extension.
///
/// Requests without `x-agit-user-id` stay anonymous. A present identity gets
/// its profile loaded, or created on first sight, before the handler runs.
pub async fn resolve_session(State(pool): State<PgPool>, mut req: Request, next: Next) -> Response {
    let identity = match identity_from_headers(req.headers()) {
        Ok(identity) => identity,
        Err(message) => return reject(StatusCode::UNAUTHORIZED, "unauthorized", message),
    };

    let session = match identity {
        None => Session::Anonymous,
        Some(identity) => match agit_db::ensure_profile(&pool, &identity).await {
            Ok(profile) => {
                Session::from_identity(Some(identity)).authenticate(profile.to_session_profile())
            }
            Err(agit_db::DbError::Conflict(reason)) => {
                tracing::warn!(
                    user_id = %identity.user_id,
                    reason = %reason,
                    "no free nickname for new profile"
                );
                return reject(
                    StatusCode::CONFLICT,
                    "conflict",
                    "could not allocate a nickname for this account",
                );
            }
            Err(e) => {
                tracing::error!(error = %e, user_id = %identity.user_id, "profile lookup failed");
                return reject(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "profile lookup failed",
                );
            }
        },
    };

    req.extensions_mut().insert(session);
    next.run(req).await
}

/// Middleware admitting only the configured administrator.
pub async fn require_admin(
    State(config): State<Arc<AppConfig>>,
    req: Request,
    next: Next,
) -> Response {
    let session = req.extensions().get::<Session>().cloned().unwrap_or_default();
    match admin_rejection(&config, &session) {
        Some(response) => response,
        None => next.run(req).await,
    }
}

fn admin_rejection(config: &AppConfig, session: &Session) -> Option<Response> {
    if !session.is_authenticated() {
        return Some(reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "sign in required",
        ));
    }
    if !config.is_admin_email(session.email()) {
        return Some(reject(
            StatusCode::FORBIDDEN,
            "forbidden",
            "administrator access required",
        ));
    }
    None
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return reject(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded",
        );
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

/// Identity asserted by the auth proxy, if any.
///
/// Header values are decoded as UTF-8 so Korean display names survive.
fn identity_from_headers(headers: &HeaderMap) -> Result<Option<Identity>, &'static str> {
    let Some(raw_id) = header_text(headers, USER_ID_HEADER) else {
        return Ok(None);
    };
    let user_id = Uuid::parse_str(raw_id).map_err(|_| "x-agit-user-id must be a UUID")?;

    Ok(Some(Identity {
        user_id,
        email: header_text(headers, USER_EMAIL_HEADER).map(str::to_owned),
        display_name: header_text(headers, USER_NAME_HEADER).map(str::to_owned),
    }))
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
