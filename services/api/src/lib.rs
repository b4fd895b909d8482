//! Campus Hub API service
//!
//! A campus community backend: lost & found, marketplace, buy requests,
//! rentals, question papers, a FAQ chatbot, and a notification feed with
//! realtime push for connected clients.

pub mod chatbot;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod rate_limiter;
pub mod realtime;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod state;
pub mod uploads;
pub mod validation;

/// Embedded database migrations
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
