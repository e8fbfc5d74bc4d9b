//! Visage Server - Main entry point.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use visage_api::AppState;
use visage_auth::{
    AuthConfig, IdentityResolver, JwksBearerVerifier, ProviderConfig, RemoteSessionUnsealer,
    SessionIssuer,
};
use visage_storage::{AvatarStore, MemoryBackend, ObjectStore, UserStore};
use visage_storage_sqlite::SqliteBackend;

#[derive(Parser)]
#[command(name = "visage-server")]
#[command(about = "Visage - avatar management backend")]
#[command(version)]
struct Cli {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8300", env = "VISAGE_BIND_ADDRESS")]
    bind: String,

    /// Data directory for the SQLite database
    #[arg(long, default_value = "data", env = "VISAGE_DATA_DIR")]
    data_dir: String,

    /// Enable development mode (in-memory storage)
    #[arg(long, env = "VISAGE_DEV_MODE")]
    dev: bool,

    /// HS256 signing secret for session tokens (min 32 bytes)
    #[arg(long, env = "VISAGE_TOKEN_SECRET", hide_env_values = true)]
    token_secret: String,

    /// Audience identifier expected in provider bearer tokens
    #[arg(long, default_value = "visage", env = "VISAGE_AUDIENCE")]
    audience: String,

    /// Identity provider JWKS URL
    #[arg(long, env = "VISAGE_PROVIDER_JWKS_URL")]
    jwks_url: String,

    /// Identity provider session-authentication endpoint
    #[arg(long, env = "VISAGE_PROVIDER_SESSION_URL")]
    session_url: String,

    /// Symmetric secret for unsealing provider session cookies
    #[arg(long, env = "VISAGE_COOKIE_PASSWORD", hide_env_values = true)]
    cookie_password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = AuthConfig::new(cli.token_secret, cli.audience);
    // A weak secret aborts boot; the token codec still re-checks per call.
    config.validate()?;

    let provider = ProviderConfig {
        jwks_url: cli.jwks_url,
        session_url: cli.session_url,
        cookie_password: cli.cookie_password,
    };

    tracing::info!("Starting Visage server...");
    tracing::info!("Bind address: {}", cli.bind);

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let verifier = Arc::new(JwksBearerVerifier::new(
        http.clone(),
        provider.jwks_url.clone(),
    ));
    let unsealer = Arc::new(RemoteSessionUnsealer::new(
        http,
        provider.session_url.clone(),
        provider.cookie_password.clone(),
    ));

    let (users, objects, avatars): (
        Arc<dyn UserStore>,
        Arc<dyn ObjectStore>,
        Arc<dyn AvatarStore>,
    ) = if cli.dev {
        tracing::warn!("Development mode enabled - in-memory storage, nothing is persisted");
        let backend = MemoryBackend::new();
        (
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            Arc::new(backend),
        )
    } else {
        let backend = SqliteBackend::open(&cli.data_dir).await?;
        (
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            Arc::new(backend),
        )
    };

    let resolver = Arc::new(IdentityResolver::new(
        config.clone(),
        verifier,
        unsealer,
        users,
    ));
    let issuer = Arc::new(SessionIssuer::new(config.clone()));

    let state = AppState {
        config,
        resolver,
        issuer,
        objects,
        avatars,
    };

    let listener = tokio::net::TcpListener::bind(&cli.bind).await?;
    tracing::info!("Visage server started successfully");

    axum::serve(listener, visage_api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
