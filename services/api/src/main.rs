use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::database::{DatabaseConfig, init_pool};

use api::MIGRATOR;
use api::config::{ChatConfig, ServerConfig};
use api::notify::Notifier;
use api::rate_limiter::{RateLimiter, RateLimiterConfig};
use api::realtime::ConnectionRegistry;
use api::repositories::{
    BuildingRepository, NotificationRepository, ResourceRepository, UserRepository,
};
use api::routes::create_router;
use api::session::SessionStore;
use api::state::AppState;
use api::uploads::UploadStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting Campus Hub API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    common::database::run_migrations(&pool, &MIGRATOR).await?;
    info!("Database migrations applied");

    let server_config = ServerConfig::from_env();

    let user_repository = UserRepository::new(pool.clone());
    let resource_repository = ResourceRepository::new(pool.clone());
    let notification_repository = NotificationRepository::new(pool.clone());
    let building_repository = BuildingRepository::new(pool.clone());
    let sessions = SessionStore::new();
    let registry = ConnectionRegistry::new();
    let notifier = Notifier::new(notification_repository.clone(), registry.clone());

    let app_state = AppState {
        db_pool: pool,
        user_repository,
        resource_repository,
        notification_repository,
        building_repository,
        sessions,
        registry,
        notifier,
        uploads: UploadStore::new(server_config.upload_dir.clone()),
        lost_limiter: RateLimiter::new(RateLimiterConfig::new(20, 60)),
        paper_limiter: RateLimiter::new(RateLimiterConfig::new(10, 60)),
        market_limiter: RateLimiter::new(RateLimiterConfig::new(15, 60)),
        http_client: reqwest::Client::new(),
        chat: ChatConfig::from_env(),
    };

    // Start the web server
    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&server_config.bind_address).await?;
    info!("Campus Hub API listening on {}", server_config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
