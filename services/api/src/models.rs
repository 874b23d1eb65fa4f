//! API models for request and response payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub mod menu;
pub mod order;

/// Closed set of principal roles, mirroring what the auth service issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Vendor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Vendor => "VENDOR",
            Role::Admin => "ADMIN",
        }
    }
}

/// Public student fields shown to counterparties
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentPublic {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public vendor fields shown to counterparties
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VendorPublic {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short vendor projection embedded in menu listings
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VendorSummary {
    pub id: Uuid,
    pub name: String,
    pub location: String,
}

/// Category entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// Student profile update payload
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateStudentProfile {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Vendor profile update payload
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateVendorProfile {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}
