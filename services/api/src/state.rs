//! Application state shared across handlers

use sqlx::PgPool;

use crate::config::ChatConfig;
use crate::notify::Notifier;
use crate::rate_limiter::RateLimiter;
use crate::realtime::ConnectionRegistry;
use crate::repositories::{
    BuildingRepository, NotificationRepository, ResourceRepository, UserRepository,
};
use crate::session::SessionStore;
use crate::uploads::UploadStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub user_repository: UserRepository,
    pub resource_repository: ResourceRepository,
    pub notification_repository: NotificationRepository,
    pub building_repository: BuildingRepository,
    pub sessions: SessionStore,
    pub registry: ConnectionRegistry,
    pub notifier: Notifier,
    pub uploads: UploadStore,
    pub lost_limiter: RateLimiter,
    pub paper_limiter: RateLimiter,
    pub market_limiter: RateLimiter,
    pub http_client: reqwest::Client,
    pub chat: ChatConfig,
}
