use std::net::SocketAddr;
use std::sync::Arc;

use common_auth::{ApiKeyGate, DiscoveryClient, KeyResolver, TokenVerifier, VerifierConfig};
use sqlx::PgPool;
use tokio::net::TcpListener;

use item_service::app::{build_router, AppState};
use item_service::config::load_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = load_config()?;

    let db = PgPool::connect(&config.database_url).await?;
    // Ensure database schema is up to date before serving traffic
    sqlx::migrate!("./migrations").run(&db).await?;

    let mut verifier_config = VerifierConfig::new(config.issuer.clone());
    if let Some(audience) = &config.audience {
        verifier_config = verifier_config.with_audience(audience.clone());
    }
    if config.validate_expiry {
        verifier_config = verifier_config.with_expiry_validation();
    }

    let resolver = KeyResolver::new(DiscoveryClient::new(config.discovery_url.clone()));
    let verifier = Arc::new(TokenVerifier::new(verifier_config, resolver));
    let api_key = Arc::new(ApiKeyGate::new(config.api_key.clone()));

    let state = AppState::new(db, verifier, api_key);
    let app = build_router(state, &config.cors_origins);

    let ip: std::net::IpAddr = config.host.parse()?;
    let addr = SocketAddr::from((ip, config.port));
    println!("starting item-service on {addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
