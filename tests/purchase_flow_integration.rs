use actix_web::test::TestRequest;
use actix_web::{test, web, App};
use serde_json::json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use teespark_server::api;
use teespark_server::api::auth::{generate_jwt, JwtMiddleware};
use teespark_server::api::razorpay::sign_hmac_sha256_hex;
use teespark_server::db;

mod support;

const TEST_SECRET: &str = "test-razorpay-secret";

async fn insert_user(pool: &PgPool, role: &str, suffix: &str) -> i32 {
    sqlx::query(
        r#"INSERT INTO users (username, email, password_hash, role)
           VALUES ($1, $2, 'test-hash', $3)
           RETURNING id"#,
    )
    .bind(format!("{role}_{suffix}"))
    .bind(format!("{role}_{suffix}@teespark.example"))
    .bind(role)
    .fetch_one(pool)
    .await
    .expect("insert user")
    .get("id")
}

async fn insert_design(pool: &PgPool, designer_id: i32, title: &str) -> i32 {
    sqlx::query(
        r#"INSERT INTO designs (designer_id, title, description, image_url, price, tags)
           VALUES ($1, $2, 'A test design', 'https://img.teespark.example/d.png', 25.00,
                   ARRAY['minimal', 'space'])
           RETURNING id"#,
    )
    .bind(designer_id)
    .bind(title)
    .fetch_one(pool)
    .await
    .expect("insert design")
    .get("id")
}

async fn purchase_count(pool: &PgPool, payment_id: &str) -> i64 {
    sqlx::query("SELECT COUNT(*) AS n FROM purchases WHERE payment_id = $1")
        .bind(payment_id)
        .fetch_one(pool)
        .await
        .expect("count purchases")
        .get("n")
}

macro_rules! payment_app {
    ($state:expr) => {
        test::init_service(
            App::new().app_data($state.clone()).service(
                web::scope("/api")
                    .wrap(JwtMiddleware)
                    .service(api::payments::create_order)
                    .service(api::payments::verify_payment)
                    .service(api::purchases::list_my_purchases),
            ),
        )
        .await
    };
}

#[actix_web::test]
async fn verified_payment_records_single_paid_purchase() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().to_string();

    let designer_id = insert_user(pool, "Designer", &suffix).await;
    let buyer_id = insert_user(pool, "Buyer", &suffix).await;
    let design_id = insert_design(pool, designer_id, "Orbit Tee").await;

    let state = web::Data::new(support::build_state(test_db.pool.clone(), TEST_SECRET));
    let app = payment_app!(state);

    let token = generate_jwt(buyer_id).expect("jwt");
    let order_id = format!("order_{suffix}");
    let payment_id = format!("pay_{suffix}");
    let signature = sign_hmac_sha256_hex(TEST_SECRET, &format!("{order_id}|{payment_id}"));

    let payload = json!({
        "order_id": order_id,
        "payment_id": payment_id,
        "signature": signature,
        "buyerId": buyer_id,
        "designId": design_id,
        "amount": 2500,
        "currency": "INR"
    });

    let req = TestRequest::post()
        .uri("/api/payment/verify-payment")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(&payload)
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "success");
    let purchase_id = body["purchaseId"].as_i64().expect("purchase id");

    let row = sqlx::query("SELECT amount, currency, status FROM purchases WHERE payment_id = $1")
        .bind(&payment_id)
        .fetch_one(pool)
        .await
        .expect("select purchase");
    assert_eq!(row.get::<i64, _>("amount"), 2500);
    assert_eq!(row.get::<String, _>("currency"), "INR");
    assert_eq!(row.get::<String, _>("status"), "paid");

    // Retried callback: same response, still exactly one row.
    let req = TestRequest::post()
        .uri("/api/payment/verify-payment")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(&payload)
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "success");
    assert_eq!(body["purchaseId"].as_i64(), Some(purchase_id));
    assert_eq!(purchase_count(pool, &payment_id).await, 1);
}

#[actix_web::test]
async fn forged_signature_is_rejected_without_ledger_write() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().to_string();

    let designer_id = insert_user(pool, "Designer", &suffix).await;
    let buyer_id = insert_user(pool, "Buyer", &suffix).await;
    let design_id = insert_design(pool, designer_id, "Nebula Tee").await;

    let state = web::Data::new(support::build_state(test_db.pool.clone(), TEST_SECRET));
    let app = payment_app!(state);

    let token = generate_jwt(buyer_id).expect("jwt");
    let order_id = format!("order_{suffix}");
    let payment_id = format!("pay_{suffix}");

    // Signed with the wrong secret, as a forger without the key would.
    let forged = sign_hmac_sha256_hex("attacker-guess", &format!("{order_id}|{payment_id}"));

    let req = TestRequest::post()
        .uri("/api/payment/verify-payment")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({
            "order_id": order_id,
            "payment_id": payment_id,
            "signature": forged,
            "buyerId": buyer_id,
            "designId": design_id,
            "amount": 2500
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"status": "failure"}));
    assert_eq!(purchase_count(pool, &payment_id).await, 0);
}

#[actix_web::test]
async fn buyer_mismatch_is_rejected() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().to_string();

    let designer_id = insert_user(pool, "Designer", &suffix).await;
    let buyer_id = insert_user(pool, "Buyer", &suffix).await;
    let other_id = insert_user(pool, "Admin", &suffix).await;
    let design_id = insert_design(pool, designer_id, "Comet Tee").await;

    let state = web::Data::new(support::build_state(test_db.pool.clone(), TEST_SECRET));
    let app = payment_app!(state);

    let order_id = format!("order_{suffix}");
    let payment_id = format!("pay_{suffix}");
    let signature = sign_hmac_sha256_hex(TEST_SECRET, &format!("{order_id}|{payment_id}"));

    // Session belongs to `other_id`, body claims `buyer_id`.
    let token = generate_jwt(other_id).expect("jwt");
    let req = TestRequest::post()
        .uri("/api/payment/verify-payment")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({
            "order_id": order_id,
            "payment_id": payment_id,
            "signature": signature,
            "buyerId": buyer_id,
            "designId": design_id,
            "amount": 2500
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    assert_eq!(purchase_count(pool, &payment_id).await, 0);
}

#[actix_web::test]
async fn create_order_rejects_non_positive_amount() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().to_string();

    let buyer_id = insert_user(pool, "Buyer", &suffix).await;

    let state = web::Data::new(support::build_state(test_db.pool.clone(), TEST_SECRET));
    let app = payment_app!(state);
    let token = generate_jwt(buyer_id).expect("jwt");

    for amount in [0i64, -2500] {
        let req = TestRequest::post()
            .uri("/api/payment/create-order")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({"amount": amount, "currency": "INR"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}

#[actix_web::test]
async fn payment_routes_require_a_session() {
    let test_db = support::init_test_db().await;

    let state = web::Data::new(support::build_state(test_db.pool.clone(), TEST_SECRET));
    let app = payment_app!(state);

    let req = TestRequest::post()
        .uri("/api/payment/create-order")
        .set_json(json!({"amount": 2500}))
        .to_request();
    let resp = test::try_call_service(&app, req).await;

    assert!(resp.is_err(), "unauthenticated request must be rejected");
}

#[actix_web::test]
async fn session_cookie_is_accepted_like_bearer() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().to_string();

    let buyer_id = insert_user(pool, "Buyer", &suffix).await;

    let state = web::Data::new(support::build_state(test_db.pool.clone(), TEST_SECRET));
    let app = payment_app!(state);
    let token = generate_jwt(buyer_id).expect("jwt");

    let req = TestRequest::get()
        .uri("/api/purchases")
        .cookie(actix_web::cookie::Cookie::new("token", token))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!([]));
}

#[actix_web::test]
async fn purchase_history_is_scoped_to_the_buyer() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().to_string();

    let designer_id = insert_user(pool, "Designer", &suffix).await;
    let buyer_id = insert_user(pool, "Buyer", &suffix).await;
    let other_buyer_id = insert_user(pool, "Admin", &suffix).await;
    let design_id = insert_design(pool, designer_id, "Quasar Tee").await;

    let (purchase, inserted) = db::record_paid_purchase(
        pool,
        buyer_id,
        design_id,
        &format!("pay_{suffix}"),
        &format!("order_{suffix}"),
        2500,
        "INR",
    )
    .await
    .expect("record purchase");
    assert!(inserted);

    let state = web::Data::new(support::build_state(test_db.pool.clone(), TEST_SECRET));
    let app = payment_app!(state);

    let token = generate_jwt(buyer_id).expect("jwt");
    let req = TestRequest::get()
        .uri("/api/purchases")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let listed = body.as_array().expect("array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"].as_i64(), Some(i64::from(purchase.id)));
    assert_eq!(listed[0]["status"], "paid");

    let token = generate_jwt(other_buyer_id).expect("jwt");
    let req = TestRequest::get()
        .uri("/api/purchases")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!([]));
}

#[actix_web::test]
async fn record_paid_purchase_is_idempotent_per_payment_id() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().to_string();

    let designer_id = insert_user(pool, "Designer", &suffix).await;
    let buyer_id = insert_user(pool, "Buyer", &suffix).await;
    let design_id = insert_design(pool, designer_id, "Pulsar Tee").await;
    let payment_id = format!("pay_{suffix}");
    let order_id = format!("order_{suffix}");

    let (first, inserted) =
        db::record_paid_purchase(pool, buyer_id, design_id, &payment_id, &order_id, 2500, "INR")
            .await
            .expect("first record");
    assert!(inserted);

    let (second, inserted) =
        db::record_paid_purchase(pool, buyer_id, design_id, &payment_id, &order_id, 2500, "INR")
            .await
            .expect("second record");
    assert!(!inserted);
    assert_eq!(second.id, first.id);
    assert_eq!(purchase_count(pool, &payment_id).await, 1);
}

#[actix_web::test]
async fn purchase_status_transitions_at_most_once() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().to_string();

    let designer_id = insert_user(pool, "Designer", &suffix).await;
    let buyer_id = insert_user(pool, "Buyer", &suffix).await;
    let design_id = insert_design(pool, designer_id, "Eclipse Tee").await;

    // A pending record moves exactly once.
    let pending_id: i32 = sqlx::query(
        r#"INSERT INTO purchases (buyer_id, design_id, payment_id, order_id, amount, currency, status)
           VALUES ($1, $2, $3, $4, 2500, 'INR', 'created')
           RETURNING id"#,
    )
    .bind(buyer_id)
    .bind(design_id)
    .bind(format!("pay_pending_{suffix}"))
    .bind(format!("order_pending_{suffix}"))
    .fetch_one(pool)
    .await
    .expect("insert pending purchase")
    .get("id");

    assert!(db::set_purchase_status(pool, pending_id, "failed")
        .await
        .expect("first transition"));
    assert!(!db::set_purchase_status(pool, pending_id, "paid")
        .await
        .expect("second transition"));

    let status: String = sqlx::query("SELECT status FROM purchases WHERE id = $1")
        .bind(pending_id)
        .fetch_one(pool)
        .await
        .expect("select status")
        .get("status");
    assert_eq!(status, "failed");

    // A paid record never moves again.
    let (paid, _) = db::record_paid_purchase(
        pool,
        buyer_id,
        design_id,
        &format!("pay_paid_{suffix}"),
        &format!("order_paid_{suffix}"),
        2500,
        "INR",
    )
    .await
    .expect("record paid purchase");

    assert!(!db::set_purchase_status(pool, paid.id, "failed")
        .await
        .expect("transition on paid"));

    let status: String = sqlx::query("SELECT status FROM purchases WHERE id = $1")
        .bind(paid.id)
        .fetch_one(pool)
        .await
        .expect("select status")
        .get("status");
    assert_eq!(status, "paid");
}

#[actix_web::test]
async fn failed_receipt_dispatch_does_not_fail_the_purchase() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().to_string();

    let designer_id = insert_user(pool, "Designer", &suffix).await;
    let buyer_id = insert_user(pool, "Buyer", &suffix).await;
    let design_id = insert_design(pool, designer_id, "Aurora Tee").await;

    let state = web::Data::new(support::build_state(test_db.pool.clone(), TEST_SECRET));
    // Real send path against a dead SMTP endpoint: dispatch fails, purchase must not.
    std::env::set_var("MOCK_MAIL", "false");
    let app = payment_app!(state);

    let token = generate_jwt(buyer_id).expect("jwt");
    let order_id = format!("order_{suffix}");
    let payment_id = format!("pay_{suffix}");
    let signature = sign_hmac_sha256_hex(TEST_SECRET, &format!("{order_id}|{payment_id}"));

    let req = TestRequest::post()
        .uri("/api/payment/verify-payment")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({
            "order_id": order_id,
            "payment_id": payment_id,
            "signature": signature,
            "buyerId": buyer_id,
            "designId": design_id,
            "amount": 2500
        }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    std::env::set_var("MOCK_MAIL", "true");

    assert_eq!(body["status"], "success");
    assert_eq!(purchase_count(pool, &payment_id).await, 1);
}
