/// Post repository - database operations for posts
use crate::models::Post;
use sqlx::PgPool;
use uuid::Uuid;

/// Create a new post authored by `author_id`
pub async fn create_post(
    pool: &PgPool,
    author_id: Uuid,
    title: &str,
    content: &str,
    post_image: Option<&str>,
) -> Result<Post, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (title, content, author_id, post_image)
        VALUES ($1, $2, $3, $4)
        RETURNING id, title, content, author_id, post_image, created_at
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(author_id)
    .bind(post_image)
    .fetch_one(pool)
    .await
}

/// Find a post by id
pub async fn find_post_by_id(pool: &PgPool, post_id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, title, content, author_id, post_image, created_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// Update title/content/image; `None` keeps the stored value
pub async fn update_post(
    pool: &PgPool,
    post_id: Uuid,
    title: Option<&str>,
    content: Option<&str>,
    post_image: Option<&str>,
) -> Result<Post, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts
        SET title = COALESCE($2, title),
            content = COALESCE($3, content),
            post_image = COALESCE($4, post_image)
        WHERE id = $1
        RETURNING id, title, content, author_id, post_image, created_at
        "#,
    )
    .bind(post_id)
    .bind(title)
    .bind(content)
    .bind(post_image)
    .fetch_one(pool)
    .await
}

/// Delete a post; its comments go with it via the FK cascade
pub async fn delete_post(pool: &PgPool, post_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Find a user's own posts, newest first
pub async fn find_posts_by_author(
    pool: &PgPool,
    author_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, title, content, author_id, post_image, created_at
        FROM posts
        WHERE author_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(author_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Count a user's posts
pub async fn count_posts_by_author(pool: &PgPool, author_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await
}
