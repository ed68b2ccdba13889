mod api;
mod middleware;

use std::sync::Arc;

use agit_geocoder::{GeocoderConfig, KakaoGeocoder};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::RateLimitState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(agit_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = agit_db::PoolConfig::from_app_config(&config);
    let pool = agit_db::connect_pool(&config.database_url, pool_config).await?;
    agit_db::run_migrations(&pool).await?;

    let public_sources = Arc::new(agit_core::load_public_sources(
        &config.public_sources_path,
    )?);
    let geocoder = init_geocoder(&config).await;

    let rate_limit = RateLimitState::per_minute(config.rate_limit_per_minute);
    let state = AppState {
        pool,
        config: Arc::clone(&config),
        geocoder,
        public_sources,
    };
    let app = build_app(state, rate_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "agit-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Geocoding is optional: a missing key or a failed probe leaves it disabled.
async fn init_geocoder(config: &agit_core::AppConfig) -> Option<Arc<KakaoGeocoder>> {
    let Some(geocoder_config) = GeocoderConfig::from_app_config(config) else {
        tracing::warn!("KAKAO_REST_API_KEY not set; geocoding endpoints disabled");
        return None;
    };

    match KakaoGeocoder::initialize(geocoder_config).await {
        Ok(geocoder) => Some(Arc::new(geocoder)),
        Err(e) => {
            tracing::warn!(error = %e, "geocoder initialization failed; geocoding disabled");
            None
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
