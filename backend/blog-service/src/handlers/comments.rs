/// Comment handlers - HTTP endpoints for comment operations
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::db::{comment_repo, post_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::services::{listing, ownership};

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, message = "The content field is required"))]
    pub content: String,
}

/// Create a comment on a post; 404 if the post does not exist
pub async fn create(
    pool: web::Data<PgPool>,
    user: AuthUser,
    post_id: web::Path<Uuid>,
    payload: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    post_repo::find_post_by_id(&pool, *post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let comment = comment_repo::create_comment(&pool, *post_id, user.0, &payload.content).await?;

    tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "comment created");

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": {
            "comment": comment,
        }
    })))
}

/// List a post's comments, newest first, each joined with its author
pub async fn index(pool: web::Data<PgPool>, post_id: web::Path<Uuid>) -> Result<HttpResponse> {
    let mut grouped = listing::comments_for_posts(&pool, &[*post_id]).await?;
    let comments = grouped.remove(&*post_id).unwrap_or_default();

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": {
            "comments": comments,
        }
    })))
}

/// Update a comment's content - author only
pub async fn update(
    pool: web::Data<PgPool>,
    user: AuthUser,
    comment_id: web::Path<Uuid>,
    payload: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let comment = comment_repo::find_comment_by_id(&pool, *comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    ownership::check_comment_ownership(user.0, &comment)?;

    let updated = comment_repo::update_comment(&pool, comment.id, &payload.content).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": {
            "comment": updated,
        }
    })))
}

/// Delete a comment - author only
pub async fn delete(
    pool: web::Data<PgPool>,
    user: AuthUser,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comment = comment_repo::find_comment_by_id(&pool, *comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    ownership::check_comment_ownership(user.0, &comment)?;

    comment_repo::delete_comment(&pool, comment.id).await?;

    Ok(HttpResponse::NoContent().finish())
}
