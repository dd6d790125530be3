use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pii::Masked;

/// A registered user. Username and email are unique across all accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Never part of an API response.
    #[serde(skip_serializing, default)]
    pub password_hash: Masked<String>,
    pub phone: String,
    pub country: String,
    pub city: String,
    pub img: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
