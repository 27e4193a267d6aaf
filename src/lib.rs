pub mod api;
pub mod db;
pub mod docs;
pub mod mailer;
pub mod models;

use sqlx::PgPool;

use crate::mailer::Mailer;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub razorpay_key_id: String,
    /// Server-held signing secret. Never serialized, never sent to clients.
    pub razorpay_key_secret: String,
    pub mailer: Mailer,
}
