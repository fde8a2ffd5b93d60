mod api;
mod middleware;

use std::sync::Arc;

use kwprice_core::{load_configured_targets, AppConfig, TargetsFile};
use kwprice_scraper::{
    Aggregator, DiscoveryEndpoints, FetchSettings, HttpFetcher, SourceDiscoverer,
};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};
use crate::middleware::RateLimitState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = kwprice_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let targets = load_configured_targets(&config)?;
    tracing::info!(
        env = %config.env,
        products = targets.products.len(),
        food = targets.food.len(),
        "loaded target sites"
    );

    let state = build_state(&config, &targets)?;
    let rate_limit = RateLimitState::per_minute(config.rate_limit_per_minute);
    let app = build_app(state, rate_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "kwprice-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_state(config: &AppConfig, targets: &TargetsFile) -> anyhow::Result<AppState> {
    let fetcher = HttpFetcher::new(&FetchSettings::from_config(config))?;
    let discoverer = Arc::new(SourceDiscoverer::from_config(
        config,
        DiscoveryEndpoints::default(),
    ));
    Ok(AppState {
        products: Arc::new(Aggregator::for_targets(
            &targets.products,
            config,
            &fetcher,
            &discoverer,
        )),
        food: Arc::new(Aggregator::for_targets(
            &targets.food,
            config,
            &fetcher,
            &discoverer,
        )),
        default_city: Arc::from(config.default_city.as_str()),
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
