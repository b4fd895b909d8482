//! Notification model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category tag carried by every notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Lost,
    Found,
    Buy,
    Sell,
    Service,
    Rental,
}

impl NotificationKind {
    /// Storage tag for the `kind` column
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lost => "lost",
            Self::Found => "found",
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Service => "service",
            Self::Rental => "rental",
        }
    }

    /// Parse a storage tag back into the kind
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lost" => Some(Self::Lost),
            "found" => Some(Self::Found),
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            "service" => Some(Self::Service),
            "rental" => Some(Self::Rental),
            _ => None,
        }
    }
}

/// Notification entity, always owned by exactly one user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub resource_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for the inbox listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Number of items per page
    pub limit: Option<u32>,
    /// Only return unread notifications
    pub unread_only: Option<bool>,
}

/// Response for the inbox listing with pagination
#[derive(Debug, Clone, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
    pub total: i64,
    pub page: u32,
    pub pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_roundtrip() {
        for kind in [
            NotificationKind::Lost,
            NotificationKind::Found,
            NotificationKind::Buy,
            NotificationKind::Sell,
            NotificationKind::Service,
            NotificationKind::Rental,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("unknown"), None);
    }

    #[test]
    fn test_notification_serializes_type_tag() {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: NotificationKind::Sell,
            title: "New Item for Sale".to_string(),
            message: "Asha is selling: Calculator for ₹500".to_string(),
            resource_id: None,
            read: false,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&notification).expect("notification serializes");
        assert_eq!(value["type"], "sell");
        assert_eq!(value["read"], false);
    }
}
