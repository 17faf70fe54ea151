/// User handlers - registration, login and profile management
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::config::Config;
use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::User;
use crate::security::{jwt, password};
use crate::services::images;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "The name field is required"))]
    pub name: String,

    #[validate(email(message = "A valid email is required"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "The password field is required"))]
    pub password: String,
}

fn issue_token(user: &User) -> Result<String> {
    jwt::generate_token(user.id).map_err(|e| AppError::Internal(e.to_string()))
}

/// Register a new user and return a bearer token
pub async fn register(
    pool: web::Data<PgPool>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if user_repo::find_by_email(&pool, &payload.email).await?.is_some() {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let password_hash = password::hash_password(&payload.password)?;
    let user = user_repo::create_user(&pool, &payload.name, &payload.email, &password_hash).await?;
    let token = issue_token(&user)?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "token": token,
            "createdAt": user.created_at,
        }
    })))
}

/// Verify credentials and return a bearer token
pub async fn login(
    pool: web::Data<PgPool>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = user_repo::find_by_email(&pool, &payload.email).await?;

    let Some(user) = user.filter(|u| password::verify_password(&payload.password, &u.password_hash))
    else {
        return Err(AppError::Authentication(
            "Invalid email or password".to_string(),
        ));
    };

    let token = issue_token(&user)?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "token": token,
        }
    })))
}

/// Fetch the acting identity's profile
pub async fn profile(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    user: AuthUser,
) -> Result<HttpResponse> {
    let record = user_repo::find_by_id(&pool, user.0)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let base_url = images::request_base_url(&req);

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": {
            "id": record.id,
            "name": record.name,
            "email": record.email,
            "profileImage": images::absolute_image_url(&base_url, record.profile_image.as_deref()),
            "createdAt": record.created_at,
        }
    })))
}

/// Update name/email and optionally the profile picture (multipart)
pub async fn update_profile(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    req: HttpRequest,
    user: AuthUser,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let existing = user_repo::find_by_id(&pool, user.0)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let form = images::read_profile_form(&mut payload, &config.uploads.dir).await?;

    if form.image.is_some() {
        if let Some(old) = &existing.profile_image {
            images::remove_stored_image(&config.uploads.dir, old).await;
        }
    }

    let updated = user_repo::update_profile(
        &pool,
        user.0,
        form.name.as_deref(),
        form.email.as_deref(),
        form.image.as_deref(),
    )
    .await?;

    let base_url = images::request_base_url(&req);

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": {
            "id": updated.id,
            "name": updated.name,
            "email": updated.email,
            "profileImage": images::absolute_image_url(&base_url, updated.profile_image.as_deref()),
            "createdAt": updated.created_at,
        }
    })))
}
