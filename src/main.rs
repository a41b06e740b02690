use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use shrinker::analytics::GeoIpService;
use shrinker::auth::AuthService;
use shrinker::config::Config;
use shrinker::storage::{SqliteStorage, Storage};
use shrinker::{api, redirect};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    info!("Using SQLite storage: {}", config.database.url);
    let storage: Arc<dyn Storage> = Arc::new(
        SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
    );

    info!("Initializing database...");
    storage.init().await?;
    info!("Database initialized successfully");

    // GeoIP is optional; without a database enrichment reports "Unknown"
    let geoip = match config.analytics.geoip_db_path.as_deref() {
        Some(path) => {
            info!("GeoIP database loaded from {}", path);
            Some(Arc::new(GeoIpService::new(Some(path))?))
        }
        None => {
            info!("No GeoIP database configured, countries will report as Unknown");
            None
        }
    };

    let auth = Arc::new(AuthService::new(&config.auth.secret));

    // Create routers
    let api_router = api::create_api_router(
        Arc::clone(&storage),
        auth,
        config.public_base_url.clone(),
    );
    let redirect_router = redirect::create_redirect_router(
        Arc::clone(&storage),
        geoip,
        config.analytics.trust_forwarded_headers,
    );

    // Start API server
    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("API server listening on http://{}", api_addr);

    // Start redirect server
    let redirect_addr = format!(
        "{}:{}",
        config.redirect_server.host, config.redirect_server.port
    );
    let redirect_listener = tokio::net::TcpListener::bind(&redirect_addr).await?;
    info!("Redirect server listening on http://{}", redirect_addr);

    // Run both servers concurrently
    tokio::try_join!(
        axum::serve(
            api_listener,
            api_router.into_make_service_with_connect_info::<SocketAddr>()
        ),
        axum::serve(
            redirect_listener,
            redirect_router.into_make_service_with_connect_info::<SocketAddr>()
        ),
    )?;

    Ok(())
}
