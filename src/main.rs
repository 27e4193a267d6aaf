// src/main.rs
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use dotenvy::dotenv;
use sqlx::PgPool;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use teespark_server::{api, docs, mailer::Mailer, AppState};

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Service ready!")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // Read lazily by the auth module on every request; fail fast at boot.
    env::var("JWT_SECRET").expect("JWT_SECRET required");

    let razorpay_key_id = env::var("RAZORPAY_KEY_ID").expect("RAZORPAY_KEY_ID required");
    let razorpay_key_secret =
        env::var("RAZORPAY_KEY_SECRET").expect("RAZORPAY_KEY_SECRET required");

    let smtp_host = env::var("SMTP_HOST").expect("SMTP_HOST required");
    let smtp_port = env::var("SMTP_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(587);
    let smtp_username = env::var("SMTP_USERNAME").expect("SMTP_USERNAME required");
    let smtp_password = env::var("SMTP_PASSWORD").expect("SMTP_PASSWORD required");
    let mail_from =
        env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@teespark.example".to_string());

    let mailer = Mailer::new(
        smtp_host,
        smtp_port,
        smtp_username,
        smtp_password,
        mail_from,
        "TeeSpark".to_string(),
    );

    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);

    let state = web::Data::new(AppState {
        pool,
        razorpay_key_id,
        razorpay_key_secret,
        mailer,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(index))
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            )
            // Public routes: auth and catalog browsing
            .service(api::auth::signup)
            .service(api::auth::login)
            .service(api::auth::logout)
            .service(api::designs::list_designs)
            .service(api::designs::get_design)
            // Session-guarded routes
            .service(
                web::scope("/api")
                    .wrap(api::auth::JwtMiddleware)
                    .service(api::auth::me)
                    .service(api::users::update_profile)
                    .service(api::designs::create_design)
                    .service(api::payments::create_order)
                    .service(api::payments::verify_payment)
                    .service(api::purchases::list_my_purchases),
            )
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
