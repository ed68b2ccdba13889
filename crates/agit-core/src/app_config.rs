use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub admin_email: Option<String>,
    pub dedup_radius_m: f64,
    pub public_sources_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub kakao_rest_api_key: Option<String>,
    pub geocoder_timeout_secs: u64,
    pub rate_limit_per_minute: usize,
}

impl AppConfig {
    /// Whether `email` belongs to the configured administrator.
    ///
    /// Comparison is case-insensitive; with no admin configured nobody is admin.
    #[must_use]
    pub fn is_admin_email(&self, email: Option<&str>) -> bool {
        match (self.admin_email.as_deref(), email) {
            (Some(admin), Some(candidate)) => admin.eq_ignore_ascii_case(candidate.trim()),
            _ => false,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("admin_email", &self.admin_email)
            .field("dedup_radius_m", &self.dedup_radius_m)
            .field("public_sources_path", &self.public_sources_path)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "kakao_rest_api_key",
                &self.kakao_rest_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("geocoder_timeout_secs", &self.geocoder_timeout_secs)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}
