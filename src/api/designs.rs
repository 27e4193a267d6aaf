// src/api/designs.rs

use actix_web::{get, post, web, HttpResponse, Responder};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDesignRequest {
    pub title: String,
    pub description: String,
    pub image_url: String,
    /// Decimal price, e.g. "24.99".
    pub price: String,
    pub tags: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/api/designs",
    tag = "designs",
    responses((status = 200, description = "All designs, newest first", body = [crate::models::Design]))
)]
#[get("/api/designs")]
pub async fn list_designs(state: web::Data<AppState>) -> impl Responder {
    match db::list_designs(&state.pool).await {
        Ok(designs) => HttpResponse::Ok().json(designs),
        Err(e) => {
            log::error!("list_designs db error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/designs/{id}",
    tag = "designs",
    responses(
        (status = 200, description = "Design found", body = crate::models::Design),
        (status = 404, description = "No such design")
    )
)]
#[get("/api/designs/{id}")]
pub async fn get_design(state: web::Data<AppState>, path: web::Path<i32>) -> impl Responder {
    match db::get_design(&state.pool, path.into_inner()).await {
        Ok(Some(design)) => HttpResponse::Ok().json(design),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "cannot find design"
        })),
        Err(e) => {
            log::error!("get_design db error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/designs",
    tag = "designs",
    request_body = CreateDesignRequest,
    responses(
        (status = 201, description = "Design created", body = crate::models::Design),
        (status = 400, description = "Invalid price or empty tags")
    )
)]
#[post("/designs")]
pub async fn create_design(
    state: web::Data<AppState>,
    user_id: web::ReqData<i32>,
    payload: web::Json<CreateDesignRequest>,
) -> impl Responder {
    let designer_id = *user_id;

    match payload.price.parse::<f64>() {
        Ok(p) if p > 0.0 => {}
        _ => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "price must be a positive decimal"
            }));
        }
    }

    if payload.tags.is_empty() || payload.tags.iter().any(|t| t.trim().is_empty()) {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "at least one non-empty tag is required"
        }));
    }

    match db::insert_design(
        &state.pool,
        designer_id,
        &payload.title,
        &payload.description,
        &payload.image_url,
        &payload.price,
        &payload.tags,
    )
    .await
    {
        Ok(design) => HttpResponse::Created().json(design),
        Err(e) => {
            log::error!("create_design db error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
