//! Domain resource model: one envelope shared by the five kinds of
//! community posts, with a kind-specific payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The five kinds of community posts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    LostItem,
    Marketplace,
    BuyRequest,
    Rental,
    QuestionPaper,
}

impl ResourceKind {
    /// Storage tag for the `kind` column
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LostItem => "lost-item",
            Self::Marketplace => "marketplace",
            Self::BuyRequest => "buy-request",
            Self::Rental => "rental",
            Self::QuestionPaper => "question-paper",
        }
    }

    /// Status a fresh record starts in. Lost items may override this from
    /// the submitted form; question papers carry no status at all.
    pub fn initial_status(self) -> Option<&'static str> {
        match self {
            Self::LostItem => Some("lost"),
            Self::Marketplace => Some("available"),
            Self::BuyRequest => Some("open"),
            Self::Rental => Some("available"),
            Self::QuestionPaper => None,
        }
    }

    /// Status set by the owner's transition endpoint
    pub fn closed_status(self) -> Option<&'static str> {
        match self {
            Self::LostItem => Some("found"),
            Self::Marketplace => Some("sold"),
            Self::BuyRequest => Some("fulfilled"),
            Self::Rental => Some("rented"),
            Self::QuestionPaper => None,
        }
    }
}

/// Kind-specific payload of a resource, stored as JSONB
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ResourceDetail {
    LostItem {
        title: String,
        description: String,
        location: String,
        date: String,
        contact: String,
    },
    Marketplace {
        title: String,
        description: String,
        price: f64,
        category: String,
        condition: String,
        contact: String,
    },
    BuyRequest {
        item_name: String,
        description: String,
        min_price: Option<f64>,
        max_price: Option<f64>,
        category: String,
        model: String,
        contact: String,
    },
    Rental {
        service_type: String,
        other_service_type: String,
        vehicle_type: String,
        brand: String,
        title: String,
        description: String,
        rent_per_day: f64,
        location: String,
        contact: String,
    },
    QuestionPaper {
        year: i32,
        semester: i32,
        branch: String,
        subject: String,
        subject_code: String,
    },
}

impl ResourceDetail {
    /// Which kind this payload belongs to
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::LostItem { .. } => ResourceKind::LostItem,
            Self::Marketplace { .. } => ResourceKind::Marketplace,
            Self::BuyRequest { .. } => ResourceKind::BuyRequest,
            Self::Rental { .. } => ResourceKind::Rental,
            Self::QuestionPaper { .. } => ResourceKind::QuestionPaper,
        }
    }

    /// Human label used in notification messages
    pub fn display_title(&self) -> &str {
        match self {
            Self::LostItem { title, .. } => title,
            Self::Marketplace { title, .. } => title,
            Self::BuyRequest { item_name, .. } => item_name,
            Self::Rental {
                title, service_type, ..
            } => {
                if title.is_empty() {
                    service_type
                } else {
                    title
                }
            }
            Self::QuestionPaper { subject, .. } => subject,
        }
    }
}

/// A stored community post: common envelope plus the kind-specific payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Uuid,
    #[serde(flatten)]
    pub detail: ResourceDetail,
    pub status: Option<String>,
    pub attachment: Option<String>,
    pub posted_by: String,
    pub posted_by_registration: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Query parameters accepted by the listing endpoints. Each kind only
/// reacts to the filters that exist on its payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQuery {
    pub status: Option<String>,
    /// Rental listings historically filter on `availability`
    pub availability: Option<String>,
    pub category: Option<String>,
    pub service_type: Option<String>,
    pub year: Option<i32>,
    pub semester: Option<i32>,
    pub branch: Option<String>,
    pub subject: Option<String>,
    pub subject_code: Option<String>,
}

impl ResourceQuery {
    /// Effective status filter; rentals send `availability` instead
    pub fn status_filter(&self) -> Option<&str> {
        self.status.as_deref().or(self.availability.as_deref())
    }
}
