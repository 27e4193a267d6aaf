// src/api/purchases.rs

use actix_web::{get, web, HttpResponse, Responder};

use crate::{db, AppState};

/// Purchase history for the authenticated buyer. Read-only; the ledger is
/// written exclusively by the verify-payment flow.
#[utoipa::path(
    get,
    path = "/api/purchases",
    tag = "purchases",
    responses((status = 200, description = "Purchases for the caller, newest first", body = [crate::models::Purchase]))
)]
#[get("/purchases")]
pub async fn list_my_purchases(
    state: web::Data<AppState>,
    user_id: web::ReqData<i32>,
) -> impl Responder {
    match db::list_purchases_for_buyer(&state.pool, *user_id).await {
        Ok(purchases) => HttpResponse::Ok().json(purchases),
        Err(e) => {
            log::error!("list_my_purchases db error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
