// src/models.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Public view of a user. `password_hash` never leaves the db layer.
#[derive(Debug, Serialize, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String, // Designer | Buyer | Admin
    pub avatar_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Design {
    pub id: i32,
    pub designer_id: i32,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub price: String,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Purchase {
    pub id: i32,
    pub buyer_id: i32,
    pub design_id: i32,
    pub payment_id: String,
    pub order_id: String,
    /// Minor currency units (paise for INR).
    pub amount: i64,
    pub currency: String,
    pub status: String, // created | paid | failed
    pub created_at: Option<DateTime<Utc>>,
}
