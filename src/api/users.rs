// src/api/users.rs

use actix_web::{patch, web, HttpResponse, Responder};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

#[utoipa::path(
    patch,
    path = "/api/users/me",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = crate::models::User),
        (status = 400, description = "Duplicate username or empty update")
    )
)]
#[patch("/users/me")]
pub async fn update_profile(
    state: web::Data<AppState>,
    user_id: web::ReqData<i32>,
    payload: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    if payload.username.is_none() && payload.avatar_url.is_none() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "nothing to update"
        }));
    }

    if let Some(username) = payload.username.as_deref() {
        if username.trim().is_empty() {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "username must not be empty"
            }));
        }
    }

    match db::update_user_profile(
        &state.pool,
        *user_id,
        payload.username.as_deref(),
        payload.avatar_url.as_deref(),
    )
    .await
    {
        Ok(Some(user)) => HttpResponse::Ok().json(user),
        Ok(None) => HttpResponse::Unauthorized().finish(),
        Err(e) => {
            log::warn!("update_profile rejected: {e}");
            HttpResponse::BadRequest().json(serde_json::json!({
                "error": "username already taken or invalid data"
            }))
        }
    }
}
