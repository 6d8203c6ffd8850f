use sessiongate::{
    build_router, AppConfig, AppState, ImageStore, InMemoryUserRepository, PasswordService,
    TokenService,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Pick up a local .env before reading configuration
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sessiongate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    info!(config = ?config, "Starting session gateway");

    let passwords = PasswordService::new(config.hash_params)?;
    let tokens = TokenService::new(config.jwt_secret())?;
    let images = ImageStore::new(config.upload_dir.clone());
    info!(upload_dir = %images.root().display(), "Serving uploads from disk");

    // Credentials live in memory; swap in another UserRepository to persist them
    let user_repository = Arc::new(InMemoryUserRepository::new());

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(user_repository, passwords, tokens, images, Arc::new(config));
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server running on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
