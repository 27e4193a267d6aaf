// src/api/payments.rs

use actix_web::{post, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::razorpay::{self, VerificationResult};
use crate::api::razorpay_client;
use crate::{db, AppState};

pub const DEFAULT_CURRENCY: &str = "INR";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderBody {
    /// Minor currency units (paise for INR), e.g. 2500 for 25.00.
    pub amount: i64,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentBody {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,

    #[serde(rename = "buyerId")]
    pub buyer_id: i32,

    #[serde(rename = "designId")]
    pub design_id: i32,

    pub amount: i64,
    pub currency: Option<String>,
}

/// Verification rejections share one body: nothing in the response may help
/// an attacker calibrate a forgery.
fn verification_failure() -> HttpResponse {
    HttpResponse::BadRequest().json(json!({"status": "failure"}))
}

/// Creates a payment order with the gateway and returns its identifiers.
/// Nothing is persisted locally at this step; the ledger row is written by
/// `verify_payment` once the gateway callback checks out.
#[utoipa::path(
    post,
    path = "/api/payment/create-order",
    tag = "payments",
    request_body = CreateOrderBody,
    responses(
        (status = 200, description = "Gateway order created"),
        (status = 400, description = "Invalid amount or order rejected"),
        (status = 503, description = "Gateway unavailable, retry later")
    )
)]
#[post("/payment/create-order")]
pub async fn create_order(
    state: web::Data<AppState>,
    payload: web::Json<CreateOrderBody>,
) -> impl Responder {
    let payload = payload.into_inner();

    if payload.amount <= 0 {
        return HttpResponse::BadRequest().json(json!({
            "error": "amount must be a positive count of minor currency units"
        }));
    }

    let currency = payload
        .currency
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    let order = match razorpay_client::create_order(
        &state.razorpay_key_id,
        &state.razorpay_key_secret,
        razorpay_client::CreateOrderRequest {
            amount: payload.amount,
            currency,
            receipt: format!("rcpt_{}", Uuid::new_v4()),
        },
    )
    .await
    {
        Ok(o) => o,
        Err(e) if e.is_retryable() => {
            log::error!("razorpay create_order unavailable: {e}");
            return HttpResponse::ServiceUnavailable().json(json!({
                "error": "payment gateway unavailable, please try again"
            }));
        }
        Err(e) => {
            log::error!("razorpay create_order rejected: {e}");
            return HttpResponse::BadRequest().json(json!({
                "error": "order creation rejected by gateway"
            }));
        }
    };

    HttpResponse::Ok().json(json!({
        "id": order.id,
        "amount": order.amount,
        "currency": order.currency,
    }))
}

/// Settles a checkout callback: checks the gateway signature, records the
/// purchase, and dispatches the receipt.
///
/// The callback is at-least-once delivered, so a payment id that is already
/// in the ledger is answered with the original success response. Receipt
/// dispatch is best-effort and never fails the purchase.
#[utoipa::path(
    post,
    path = "/api/payment/verify-payment",
    tag = "payments",
    request_body = VerifyPaymentBody,
    responses(
        (status = 200, description = "Payment verified, purchase recorded"),
        (status = 400, description = "Verification failed")
    )
)]
#[post("/payment/verify-payment")]
pub async fn verify_payment(
    state: web::Data<AppState>,
    user_id: web::ReqData<i32>,
    payload: web::Json<VerifyPaymentBody>,
) -> impl Responder {
    let payload = payload.into_inner();

    if payload.buyer_id != *user_id {
        log::warn!(
            "verify_payment buyer mismatch: session user_id={} claimed buyer_id={}",
            *user_id,
            payload.buyer_id
        );
        return verification_failure();
    }

    if payload.amount <= 0 {
        log::warn!(
            "verify_payment non-positive amount={} payment_id={}",
            payload.amount,
            payload.payment_id
        );
        return verification_failure();
    }

    let design = match db::get_design(&state.pool, payload.design_id).await {
        Ok(Some(d)) => d,
        Ok(None) => {
            log::warn!("verify_payment unknown design_id={}", payload.design_id);
            return verification_failure();
        }
        Err(e) => {
            log::error!("verify_payment select design error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    match razorpay::verify_payment_signature(
        &state.razorpay_key_secret,
        &payload.order_id,
        &payload.payment_id,
        &payload.signature,
    ) {
        VerificationResult::Authentic => {}
        VerificationResult::Forged => {
            log::warn!(
                "verify_payment signature mismatch order_id={} payment_id={}",
                payload.order_id,
                payload.payment_id
            );
            return verification_failure();
        }
    }

    let currency = payload
        .currency
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    // Ledger write is the correctness-critical path: db errors are loud.
    let (purchase, inserted) = match db::record_paid_purchase(
        &state.pool,
        payload.buyer_id,
        payload.design_id,
        &payload.payment_id,
        &payload.order_id,
        payload.amount,
        &currency,
    )
    .await
    {
        Ok(r) => r,
        Err(e) => {
            log::error!("verify_payment ledger insert error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if !inserted {
        log::info!(
            "verify_payment duplicate delivery payment_id={} purchase_id={}",
            purchase.payment_id,
            purchase.id
        );
        return HttpResponse::Ok().json(json!({
            "status": "success",
            "purchaseId": purchase.id,
        }));
    }

    // Receipt only for the delivery that actually created the row.
    let buyer = db::get_user(&state.pool, purchase.buyer_id).await;
    let designer = db::get_user(&state.pool, design.designer_id).await;
    match (buyer, designer) {
        (Ok(Some(buyer)), Ok(Some(designer))) => {
            if let Err(e) = state
                .mailer
                .send_receipt(&purchase, &buyer, &designer, &design)
                .await
            {
                log::warn!(
                    "receipt dispatch failed for payment_id={}: {e}",
                    purchase.payment_id
                );
            }
        }
        (buyer, designer) => {
            log::warn!(
                "receipt skipped for payment_id={}: buyer={:?} designer={:?}",
                purchase.payment_id,
                buyer.map(|u| u.is_some()),
                designer.map(|u| u.is_some())
            );
        }
    }

    HttpResponse::Ok().json(json!({
        "status": "success",
        "purchaseId": purchase.id,
    }))
}
