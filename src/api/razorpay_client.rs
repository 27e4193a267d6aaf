// src/api/razorpay_client.rs
//
// Minimal client for the Razorpay Orders API (https://api.razorpay.com)
// Auth: HTTP basic, key id as username and key secret as password.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const RAZORPAY_API_BASE: &str = "https://api.razorpay.com";

// Order creation must surface a retryable error instead of hanging.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum RazorpayError {
    Http(reqwest::Error),
    Api { status: u16, body: String },
    InvalidResponse(String),
}

impl fmt::Display for RazorpayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RazorpayError::Http(e) => write!(f, "http error: {e}"),
            RazorpayError::Api { status, body } => {
                write!(f, "razorpay api error status={status} body={body}")
            }
            RazorpayError::InvalidResponse(e) => write!(f, "invalid response: {e}"),
        }
    }
}

impl From<reqwest::Error> for RazorpayError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl RazorpayError {
    /// Transport failures and gateway 5xx can be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            RazorpayError::Http(_) => true,
            RazorpayError::Api { status, .. } => *status >= 500,
            RazorpayError::InvalidResponse(_) => false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateOrderRequest {
    /// Minor currency units (paise for INR).
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub amount: i64,
    pub currency: String,

    #[serde(default)]
    pub status: Option<String>,
}

pub async fn create_order(
    key_id: &str,
    key_secret: &str,
    req: CreateOrderRequest,
) -> Result<OrderResponse, RazorpayError> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let resp = client
        .post(format!("{RAZORPAY_API_BASE}/v1/orders"))
        .basic_auth(key_id, Some(key_secret))
        .json(&req)
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(RazorpayError::Api {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str::<OrderResponse>(&body)
        .map_err(|e| RazorpayError::InvalidResponse(format!("{e}; body={body}")))
}
