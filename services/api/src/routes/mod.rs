//! API service routes

use axum::{
    Json, Router,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde_json::json;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::middleware::{optional_auth, require_auth};
use crate::realtime;
use crate::state::AppState;

pub mod auth;
pub mod chat;
pub mod notifications;
pub mod resources;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/profile", get(auth::profile))
        .route("/api/items", post(resources::create_lost_item))
        .route("/api/found-items", post(resources::create_found_item))
        .route("/api/items/:id/found", put(resources::mark_item_found))
        .route("/api/items/:id", delete(resources::delete_lost_item))
        .route("/api/marketplace", post(resources::create_marketplace_item))
        .route("/api/marketplace/:id/sold", put(resources::mark_marketplace_sold))
        .route("/api/marketplace/:id", delete(resources::delete_marketplace_item))
        .route("/api/buy-requests", post(resources::create_buy_request))
        .route(
            "/api/buy-requests/:id/fulfilled",
            put(resources::mark_buy_request_fulfilled),
        )
        .route("/api/buy-requests/:id", delete(resources::delete_buy_request))
        .route("/api/rentals", post(resources::create_rental))
        .route("/api/rentals/:id/rented", put(resources::mark_rental_rented))
        .route("/api/rentals/:id", delete(resources::delete_rental))
        .route(
            "/api/question-papers/upload",
            post(resources::upload_question_paper),
        )
        .route(
            "/api/notifications",
            get(notifications::list).delete(notifications::delete_all),
        )
        .route(
            "/api/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route(
            "/api/notifications/mark-all-read",
            put(notifications::mark_all_read),
        )
        .route("/api/notifications/:id/read", put(notifications::mark_read))
        .route("/api/notifications/:id", delete(notifications::delete_one))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/check", get(auth::check))
        .route(
            "/api/auth/validate-registration",
            post(auth::validate_registration),
        )
        .route(
            "/api/auth/verify-registration",
            post(auth::verify_registration),
        )
        .route(
            "/api/auth/verify-security-code",
            post(auth::verify_security_code),
        )
        .route("/api/auth/reset-password", post(auth::reset_password))
        .route("/api/auth/valid-prefixes", get(auth::valid_prefixes))
        .route("/api/items", get(resources::list_lost_items))
        .route("/api/marketplace", get(resources::list_marketplace))
        .route("/api/buy-requests", get(resources::list_buy_requests))
        .route("/api/rentals", get(resources::list_rentals))
        .route("/api/question-papers", get(resources::list_question_papers))
        .route("/api/map/search", get(resources::map_search))
        .route("/api/chat", post(chat::chat))
        .layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/ws", get(realtime::ws_handler))
        .merge(protected_routes)
        .merge(public_routes)
        .nest_service("/uploads", ServeDir::new(state.uploads.root()))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "campus-hub-api"
    }))
}
