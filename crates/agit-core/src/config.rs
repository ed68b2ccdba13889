use crate::app_config::{AppConfig, Environment};
use crate::verification::{MAX_DEDUP_RADIUS_M, MIN_DEDUP_RADIUS_M};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can feed a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("AGIT_ENV", "development"))?;

    let bind_addr = or_default("AGIT_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("AGIT_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("AGIT_LOG_LEVEL", "info");
    let admin_email = optional("AGIT_ADMIN_EMAIL");

    let dedup_radius_m = or_default("AGIT_DEDUP_RADIUS_M", "50")
        .parse::<f64>()
        .map_err(|e| invalid("AGIT_DEDUP_RADIUS_M", e.to_string()))?;
    if !(MIN_DEDUP_RADIUS_M..=MAX_DEDUP_RADIUS_M).contains(&dedup_radius_m) {
        return Err(invalid(
            "AGIT_DEDUP_RADIUS_M",
            format!(
                "must be between {MIN_DEDUP_RADIUS_M} and {MAX_DEDUP_RADIUS_M} meters, got {dedup_radius_m}"
            ),
        ));
    }

    let public_sources_path = PathBuf::from(or_default(
        "AGIT_PUBLIC_SOURCES_PATH",
        "./config/public_sources.yaml",
    ));

    let db_max_connections = parse_u32("AGIT_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("AGIT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("AGIT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let kakao_rest_api_key = optional("KAKAO_REST_API_KEY");
    let geocoder_timeout_secs = parse_u64("AGIT_GEOCODER_TIMEOUT_SECS", "10")?;

    let rate_limit_per_minute = parse_usize("AGIT_RATE_LIMIT_PER_MINUTE", "120")?;
    if rate_limit_per_minute == 0 {
        return Err(invalid(
            "AGIT_RATE_LIMIT_PER_MINUTE",
            "must be greater than zero".to_string(),
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        admin_email,
        dedup_radius_m,
        public_sources_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        kakao_rest_api_key,
        geocoder_timeout_secs,
        rate_limit_per_minute,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AGIT_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
