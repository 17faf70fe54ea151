/// Post handlers - HTTP endpoints for post operations
///
/// Mutations follow lookup -> ownership check -> apply: a missing post
/// is a 404 before the guard ever runs, a non-author is a 403 before
/// anything is written.
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::db::{post_repo, user_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{AuthorView, Post, PostView};
use crate::services::{images, listing, ownership};

/// Assemble the joined view of a single post; a dangling author
/// reference surfaces as not-found, mirroring the listing's inner join.
async fn post_view(pool: &PgPool, post: Post, base_url: &str) -> Result<PostView> {
    let author = user_repo::find_by_id(pool, post.author_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let mut comments = listing::comments_for_posts(pool, &[post.id]).await?;

    Ok(PostView {
        id: post.id,
        title: post.title,
        content: post.content,
        created_at: post.created_at,
        author: AuthorView {
            id: author.id,
            name: author.name,
            email: author.email,
        },
        comments: comments.remove(&post.id).unwrap_or_default(),
        post_image: images::absolute_image_url(base_url, post.post_image.as_deref()),
    })
}

/// Create a post (multipart: `title`, `content`, optional `postImage`).
/// The author is always the acting identity, never client-supplied.
pub async fn create(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    req: HttpRequest,
    user: AuthUser,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let form = images::read_post_form(&mut payload, &config.uploads.dir).await?;

    let title = form
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("The title field is required".to_string()))?;
    let content = form
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::Validation("The content field is required".to_string()))?;

    let post =
        post_repo::create_post(&pool, user.0, &title, &content, form.image.as_deref()).await?;

    tracing::info!(post_id = %post.id, author_id = %user.0, "post created");

    let base_url = images::request_base_url(&req);
    let view = post_view(&pool, post, &base_url).await?;

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": view,
    })))
}

/// List posts - the listing engine entry point
pub async fn list(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    query: web::Query<listing::ListingQuery>,
) -> Result<HttpResponse> {
    let params = listing::ListingParams::from_query(&query);
    let base_url = images::request_base_url(&req);

    let page = listing::list_posts(&pool, &params, &base_url).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": {
            "posts": page.posts,
        },
        "metadata": page.metadata,
    })))
}

/// Fetch one post with its author and comments
pub async fn show(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = post_repo::find_post_by_id(&pool, *post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let base_url = images::request_base_url(&req);
    let view = post_view(&pool, post, &base_url).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": {
            "post": view,
        }
    })))
}

/// Update a post's title/content/image - author only
pub async fn update(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    req: HttpRequest,
    user: AuthUser,
    post_id: web::Path<Uuid>,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let post = post_repo::find_post_by_id(&pool, *post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    ownership::check_post_ownership(user.0, &post)?;

    let form = images::read_post_form(&mut payload, &config.uploads.dir).await?;

    if form.image.is_some() {
        if let Some(old) = &post.post_image {
            images::remove_stored_image(&config.uploads.dir, old).await;
        }
    }

    let updated = post_repo::update_post(
        &pool,
        post.id,
        form.title.as_deref().filter(|t| !t.trim().is_empty()),
        form.content.as_deref().filter(|c| !c.trim().is_empty()),
        form.image.as_deref(),
    )
    .await?;

    let base_url = images::request_base_url(&req);
    let view = post_view(&pool, updated, &base_url).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": {
            "updatedPost": view,
        }
    })))
}

/// Delete a post - author only
pub async fn delete(
    pool: web::Data<PgPool>,
    user: AuthUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = post_repo::find_post_by_id(&pool, *post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    ownership::check_post_ownership(user.0, &post)?;

    post_repo::delete_post(&pool, post.id).await?;

    tracing::info!(post_id = %post.id, "post deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// List the acting identity's own posts, paginated, newest first
pub async fn user_posts(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    user: AuthUser,
    query: web::Query<listing::ListingQuery>,
) -> Result<HttpResponse> {
    let params = listing::ListingParams::from_query(&query);

    let total_posts = post_repo::count_posts_by_author(&pool, user.0).await?;
    let posts =
        post_repo::find_posts_by_author(&pool, user.0, params.limit, params.offset()).await?;

    let author = user_repo::find_by_id(&pool, user.0)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let base_url = images::request_base_url(&req);
    let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
    let mut comments = listing::comments_for_posts(&pool, &post_ids).await?;

    let views: Vec<PostView> = posts
        .into_iter()
        .map(|post| PostView {
            id: post.id,
            title: post.title,
            content: post.content,
            created_at: post.created_at,
            author: AuthorView {
                id: author.id,
                name: author.name.clone(),
                email: author.email.clone(),
            },
            comments: comments.remove(&post.id).unwrap_or_default(),
            post_image: images::absolute_image_url(&base_url, post.post_image.as_deref()),
        })
        .collect();

    let total_pages = listing::total_pages(total_posts, params.limit);

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": {
            "posts": views,
            "pagination": {
                "totalPosts": total_posts,
                "currentPage": params.page,
                "totalPages": total_pages,
                "hasNextPage": params.page * params.limit < total_posts,
                "hasPreviousPage": params.page > 1,
            }
        }
    })))
}
