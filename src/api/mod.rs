pub mod auth;
pub mod designs;
pub mod payments;
pub mod purchases;
pub mod razorpay;
pub mod razorpay_client;
pub mod users;
