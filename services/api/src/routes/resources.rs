//! Community post routes: lost & found, marketplace, buy requests,
//! rentals, question papers, and the campus map search.
//!
//! Every creation broadcasts a notification to all users; every status
//! transition notifies the owner. Mutations are owner-only: a missing id
//! is NotFound, someone else's id is Forbidden.

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    CurrentUser, NotificationKind, Resource, ResourceDetail, ResourceKind, ResourceQuery,
};
use crate::rate_limiter::RateLimiter;
use crate::state::AppState;
use crate::uploads::SubmittedForm;

async fn check_rate_limit(
    limiter: &RateLimiter,
    user: &CurrentUser,
    message: &str,
) -> Result<(), ApiError> {
    if limiter.is_allowed(&user.id.to_string()).await {
        Ok(())
    } else {
        Err(ApiError::RateLimited(message.to_string()))
    }
}

/// Store the form's file part, if any, and return the stored filename
async fn save_attachment(
    state: &AppState,
    form: &SubmittedForm,
    category: &str,
) -> Result<Option<String>, ApiError> {
    let Some(file) = form.file.as_ref() else {
        return Ok(None);
    };

    let stored = state
        .uploads
        .save(category, &file.name, &file.bytes)
        .await
        .map_err(|e| {
            error!("Failed to store upload: {}", e);
            ApiError::Internal
        })?;

    Ok(Some(stored))
}

async fn create_resource(
    state: &AppState,
    owner: &CurrentUser,
    detail: &ResourceDetail,
    status: Option<&str>,
    attachment: Option<String>,
) -> Result<Resource, ApiError> {
    state
        .resource_repository
        .create(owner, detail, status, attachment)
        .await
        .map_err(|e| {
            error!("Failed to create {} post: {}", detail.kind().as_str(), e);
            ApiError::Internal
        })
}

/// Load a resource and fail closed unless the caller owns it. Absence is
/// checked first; absence and foreign ownership stay distinguishable.
async fn owned_resource(
    state: &AppState,
    kind: ResourceKind,
    id: Uuid,
    caller: &CurrentUser,
    missing: &str,
    forbidden: &str,
) -> Result<Resource, ApiError> {
    let resource = state
        .resource_repository
        .find(kind, id)
        .await
        .map_err(|e| {
            error!("Failed to load {} {}: {}", kind.as_str(), id, e);
            ApiError::Internal
        })?
        .ok_or_else(|| ApiError::NotFound(missing.to_string()))?;

    if resource.user_id != caller.id {
        return Err(ApiError::Forbidden(forbidden.to_string()));
    }

    Ok(resource)
}

fn display_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{}", price as i64)
    } else {
        format!("{price}")
    }
}

/* ---------------- lost & found ---------------- */

/// Create a lost (or already-found) item report
pub async fn create_lost_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    check_rate_limit(
        &state.lost_limiter,
        &user,
        "Too many lost/found uploads, wait 1 minute",
    )
    .await?;

    let form = SubmittedForm::read(&mut multipart, "image").await?;
    let title = form.require("title")?;
    let status = if form.text("status") == Some("found") {
        "found"
    } else {
        "lost"
    };

    let detail = ResourceDetail::LostItem {
        title: title.clone(),
        description: form.text_or_default("description"),
        location: form.text_or_default("location"),
        date: form.text_or_default("date"),
        contact: form.text_or_default("contact"),
    };

    let attachment = save_attachment(&state, &form, "lost-found").await?;
    let item = create_resource(&state, &user, &detail, Some(status), attachment).await?;

    state
        .notifier
        .notify_all(
            NotificationKind::Lost,
            "New Lost Item Reported",
            &format!("{} lost: {}", user.name, title),
            Some(item.id),
        )
        .await;

    Ok(Json(item))
}

/// Create a found item report
pub async fn create_found_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    check_rate_limit(
        &state.lost_limiter,
        &user,
        "Too many lost/found uploads, wait 1 minute",
    )
    .await?;

    let form = SubmittedForm::read(&mut multipart, "image").await?;
    let title = form.require("title")?;

    let detail = ResourceDetail::LostItem {
        title: title.clone(),
        description: form.text_or_default("description"),
        location: form.text_or_default("location"),
        date: form.text_or_default("date"),
        contact: form.text_or_default("contact"),
    };

    let attachment = save_attachment(&state, &form, "lost-found").await?;
    let item = create_resource(&state, &user, &detail, Some("found"), attachment).await?;

    state
        .notifier
        .notify_all(
            NotificationKind::Found,
            "New Found Item",
            &format!("{} found: {}", user.name, title),
            Some(item.id),
        )
        .await;

    Ok(Json(item))
}

/// List lost & found items, optionally filtered by status
pub async fn list_lost_items(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_resources(&state, ResourceKind::LostItem, &query).await
}

/// Owner marks their item as found
pub async fn mark_item_found(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let item = owned_resource(
        &state,
        ResourceKind::LostItem,
        id,
        &user,
        "Item not found",
        "You can only mark your own items as found",
    )
    .await?;

    set_status(&state, &item, "found").await?;

    state
        .notifier
        .notify_user(
            item.user_id,
            NotificationKind::Found,
            "Item Marked as Found",
            &format!(
                "Your item \"{}\" has been marked as found",
                item.detail.display_title()
            ),
            Some(item.id),
        )
        .await;

    Ok(Json(json!({"success": true})))
}

/// Owner deletes their item
pub async fn delete_lost_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let item = owned_resource(
        &state,
        ResourceKind::LostItem,
        id,
        &user,
        "Item not found",
        "You can only delete your own items",
    )
    .await?;

    delete_resource(&state, &item).await?;

    Ok(Json(json!({"success": true})))
}

/* ---------------- marketplace ---------------- */

/// Put an item up for sale
pub async fn create_marketplace_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    check_rate_limit(&state.market_limiter, &user, "Too many marketplace actions").await?;

    let form = SubmittedForm::read(&mut multipart, "image").await?;
    let title = form.require("title")?;
    let price = form.require_number("price")?;

    let detail = ResourceDetail::Marketplace {
        title: title.clone(),
        description: form.require("description")?,
        price,
        category: form.require("category")?,
        condition: form
            .text("condition")
            .unwrap_or("good")
            .to_string(),
        contact: form.require("contact")?,
    };

    let attachment = save_attachment(&state, &form, "marketplace").await?;
    let item = create_resource(&state, &user, &detail, Some("available"), attachment).await?;

    state
        .notifier
        .notify_all(
            NotificationKind::Sell,
            "New Item for Sale",
            &format!(
                "{} is selling: {} for ₹{}",
                user.name,
                title,
                display_price(price)
            ),
            Some(item.id),
        )
        .await;

    Ok(Json(item))
}

/// List marketplace items, filtered by status and category
pub async fn list_marketplace(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_resources(&state, ResourceKind::Marketplace, &query).await
}

/// Owner marks their item as sold
pub async fn mark_marketplace_sold(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let item = owned_resource(
        &state,
        ResourceKind::Marketplace,
        id,
        &user,
        "Item not found",
        "You can only mark your own items as sold",
    )
    .await?;

    set_status(&state, &item, "sold").await?;

    state
        .notifier
        .notify_user(
            item.user_id,
            NotificationKind::Sell,
            "Item Sold",
            &format!(
                "Your item \"{}\" has been marked as sold",
                item.detail.display_title()
            ),
            Some(item.id),
        )
        .await;

    Ok(Json(json!({"success": true})))
}

/// Owner removes their listing
pub async fn delete_marketplace_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let item = owned_resource(
        &state,
        ResourceKind::Marketplace,
        id,
        &user,
        "Item not found",
        "You can only delete your own items",
    )
    .await?;

    delete_resource(&state, &item).await?;

    Ok(Json(json!({"success": true})))
}

/* ---------------- buy requests ---------------- */

/// Request payload for a new buy request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyRequestPayload {
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub description: String,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub contact: String,
}

/// Post a buy request
pub async fn create_buy_request(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<BuyRequestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    check_rate_limit(&state.market_limiter, &user, "Too many marketplace actions").await?;

    if payload.item_name.trim().is_empty() || payload.contact.trim().is_empty() {
        return Err(ApiError::Validation(
            "Item name and contact are required".to_string(),
        ));
    }

    let item_name = payload.item_name.trim().to_string();
    let detail = ResourceDetail::BuyRequest {
        item_name: item_name.clone(),
        description: payload.description,
        min_price: payload.min_price,
        max_price: payload.max_price,
        category: payload.category,
        model: payload.model,
        contact: payload.contact,
    };

    let request = create_resource(&state, &user, &detail, Some("open"), None).await?;

    state
        .notifier
        .notify_all(
            NotificationKind::Buy,
            "New Buy Request",
            &format!("{} wants to buy: {}", user.name, item_name),
            Some(request.id),
        )
        .await;

    Ok(Json(request))
}

/// List buy requests, filtered by status and category
pub async fn list_buy_requests(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_resources(&state, ResourceKind::BuyRequest, &query).await
}

/// Owner marks their request as fulfilled
pub async fn mark_buy_request_fulfilled(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let request = owned_resource(
        &state,
        ResourceKind::BuyRequest,
        id,
        &user,
        "Request not found",
        "You can only mark your own requests as fulfilled",
    )
    .await?;

    set_status(&state, &request, "fulfilled").await?;

    state
        .notifier
        .notify_user(
            request.user_id,
            NotificationKind::Buy,
            "Buy Request Fulfilled",
            &format!(
                "Your request to buy \"{}\" has been marked as fulfilled",
                request.detail.display_title()
            ),
            Some(request.id),
        )
        .await;

    Ok(Json(json!({"success": true})))
}

/// Owner deletes their request
pub async fn delete_buy_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let request = owned_resource(
        &state,
        ResourceKind::BuyRequest,
        id,
        &user,
        "Request not found",
        "You can only delete your own requests",
    )
    .await?;

    delete_resource(&state, &request).await?;

    Ok(Json(json!({"success": true})))
}

/* ---------------- rentals ---------------- */

/// Post a rental service
pub async fn create_rental(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = SubmittedForm::read(&mut multipart, "image").await?;

    let title = form.require("title")?;
    let service_type = form.require("serviceType")?;
    // Older clients send `price`, newer ones `rentPerDay`
    let rent_per_day = form
        .number("price")
        .or_else(|| form.number("rentPerDay"))
        .ok_or_else(|| ApiError::Validation("rentPerDay is required".to_string()))?;

    let detail = ResourceDetail::Rental {
        service_type: service_type.clone(),
        other_service_type: form.text_or_default("otherServiceType"),
        vehicle_type: form.text_or_default("vehicleType"),
        brand: form.text_or_default("brand"),
        title: title.clone(),
        description: form.text_or_default("description"),
        rent_per_day,
        location: form.require("location")?,
        contact: form.require("contact")?,
    };

    let attachment = save_attachment(&state, &form, "rentals").await?;
    let rental = create_resource(&state, &user, &detail, Some("available"), attachment).await?;

    state
        .notifier
        .notify_all(
            NotificationKind::Rental,
            "New Rental Service",
            &format!("{} posted: {} rental", user.name, title),
            Some(rental.id),
        )
        .await;

    Ok(Json(rental))
}

/// List rental services, filtered by service type and availability
pub async fn list_rentals(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_resources(&state, ResourceKind::Rental, &query).await
}

/// Owner marks their rental as rented out
pub async fn mark_rental_rented(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let rental = owned_resource(
        &state,
        ResourceKind::Rental,
        id,
        &user,
        "Rental not found",
        "You can only mark your own rentals as rented",
    )
    .await?;

    set_status(&state, &rental, "rented").await?;

    state
        .notifier
        .notify_user(
            rental.user_id,
            NotificationKind::Rental,
            "Rental Service Rented",
            &format!(
                "Your rental \"{}\" has been marked as rented",
                rental.detail.display_title()
            ),
            Some(rental.id),
        )
        .await;

    Ok(Json(json!({"success": true})))
}

/// Owner deletes their rental listing
pub async fn delete_rental(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let rental = owned_resource(
        &state,
        ResourceKind::Rental,
        id,
        &user,
        "Rental not found",
        "You can only delete your own rentals",
    )
    .await?;

    delete_resource(&state, &rental).await?;

    Ok(Json(json!({"success": true})))
}

/* ---------------- question papers ---------------- */

/// Upload a question paper (PDF only)
pub async fn upload_question_paper(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    check_rate_limit(&state.paper_limiter, &user, "Too many question paper uploads").await?;

    let form = SubmittedForm::read(&mut multipart, "pdf").await?;

    let file = form
        .file
        .as_ref()
        .ok_or_else(|| ApiError::Validation("pdf is required".to_string()))?;
    if file.content_type != "application/pdf" {
        return Err(ApiError::Validation("Only PDFs allowed".to_string()));
    }

    let year = form.require_number("year")? as i32;
    let semester = form.require_number("semester")? as i32;

    let detail = ResourceDetail::QuestionPaper {
        year,
        semester,
        branch: form.require("branch")?,
        subject: form.require("subject")?,
        subject_code: form.require("subjectCode")?,
    };

    let attachment = save_attachment(&state, &form, "question-papers").await?;
    let paper = create_resource(&state, &user, &detail, None, attachment).await?;

    Ok(Json(json!({"success": true, "paper": paper})))
}

/// List question papers with the exam filters
pub async fn list_question_papers(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_resources(&state, ResourceKind::QuestionPaper, &query).await
}

/* ---------------- map search ---------------- */

/// Query parameters for the campus map search
#[derive(Deserialize)]
pub struct MapSearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Look up a campus building by keyword
pub async fn map_search(
    State(state): State<AppState>,
    Query(query): Query<MapSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let building = state
        .building_repository
        .search_by_keyword(&query.q)
        .await
        .map_err(|e| {
            error!("Failed to search buildings: {}", e);
            ApiError::Internal
        })?;

    Ok(Json(building))
}

/* ---------------- shared plumbing ---------------- */

async fn list_resources(
    state: &AppState,
    kind: ResourceKind,
    query: &ResourceQuery,
) -> Result<Json<Vec<Resource>>, ApiError> {
    let resources = state
        .resource_repository
        .list(kind, query)
        .await
        .map_err(|e| {
            error!("Failed to list {} posts: {}", kind.as_str(), e);
            ApiError::Internal
        })?;

    Ok(Json(resources))
}

async fn set_status(state: &AppState, resource: &Resource, status: &str) -> Result<(), ApiError> {
    state
        .resource_repository
        .set_status(resource.id, status)
        .await
        .map_err(|e| {
            error!("Failed to update status of {}: {}", resource.id, e);
            ApiError::Internal
        })
}

async fn delete_resource(state: &AppState, resource: &Resource) -> Result<(), ApiError> {
    state
        .resource_repository
        .delete(resource.id)
        .await
        .map_err(|e| {
            error!("Failed to delete {}: {}", resource.id, e);
            ApiError::Internal
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_price_drops_trailing_zero() {
        assert_eq!(display_price(500.0), "500");
        assert_eq!(display_price(499.5), "499.5");
    }
}
