//! Campus Hub models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod notification;
pub mod resource;

// Re-export for convenience
pub use notification::{Notification, NotificationKind};
pub use resource::{Resource, ResourceDetail, ResourceKind, ResourceQuery};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub registration_number: String,
    pub name: String,
    pub password_hash: String,
    pub security_code_hash: String,
    pub security_code_hint: String,
    pub email: String,
    pub phone: String,
    pub reset_token: Option<String>,
    pub reset_token_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// New user creation payload (validated, not yet hashed)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub registration_number: String,
    pub name: String,
    pub password: String,
    pub security_code: String,
    pub security_code_hint: String,
    pub email: String,
    pub phone: String,
}

/// Authenticated caller, resolved from the session store on every
/// protected request. The display fields are denormalized into records
/// the caller creates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: Uuid,
    pub registration_number: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            registration_number: user.registration_number.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

/// Campus building looked up by the map search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: Uuid,
    pub name: String,
    pub keywords: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rooms: serde_json::Value,
}
