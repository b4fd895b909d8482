//! Notification inbox routes
//!
//! All operations are scoped to the caller; an id owned by another user
//! answers NotFound so that foreign ids are indistinguishable from
//! missing ones.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::CurrentUser;
use crate::models::notification::{NotificationListResponse, NotificationQuery};
use crate::state::AppState;

/// Paged inbox listing, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<NotificationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let unread_only = query.unread_only.unwrap_or(false);

    let (notifications, total) = state
        .notification_repository
        .list_for_user(user.id, page, limit, unread_only)
        .await
        .map_err(|e| {
            error!("Failed to list notifications: {}", e);
            ApiError::Internal
        })?;

    let pages = (total + i64::from(limit) - 1) / i64::from(limit);

    Ok(Json(NotificationListResponse {
        notifications,
        total,
        page,
        pages,
    }))
}

/// Number of unread notifications
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let count = state
        .notification_repository
        .unread_count(user.id)
        .await
        .map_err(|e| {
            error!("Failed to count unread notifications: {}", e);
            ApiError::Internal
        })?;

    Ok(Json(json!({"count": count})))
}

/// Mark one notification read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = state
        .notification_repository
        .mark_read(id, user.id)
        .await
        .map_err(|e| {
            error!("Failed to mark notification read: {}", e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(Json(json!({"success": true, "notification": notification})))
}

/// Mark every notification read
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .notification_repository
        .mark_all_read(user.id)
        .await
        .map_err(|e| {
            error!("Failed to mark all notifications read: {}", e);
            ApiError::Internal
        })?;

    Ok(Json(json!({"success": true})))
}

/// Delete one notification
pub async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .notification_repository
        .delete(id, user.id)
        .await
        .map_err(|e| {
            error!("Failed to delete notification: {}", e);
            ApiError::Internal
        })?;

    if !deleted {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(Json(json!({"success": true})))
}

/// Delete every notification
pub async fn delete_all(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .notification_repository
        .delete_all(user.id)
        .await
        .map_err(|e| {
            error!("Failed to delete notifications: {}", e);
            ApiError::Internal
        })?;

    Ok(Json(json!({"success": true})))
}
