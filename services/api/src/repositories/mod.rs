//! Repositories for database operations

pub mod building;
pub mod notification;
pub mod resource;
pub mod user;

// Re-export for convenience
pub use building::BuildingRepository;
pub use notification::NotificationRepository;
pub use resource::ResourceRepository;
pub use user::UserRepository;
