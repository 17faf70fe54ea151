/// User repository - database operations for users
use crate::models::User;
use sqlx::PgPool;
use uuid::Uuid;

/// Create a new user
pub async fn create_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id, name, email, password_hash, profile_image, created_at
        "#,
    )
    .bind(name)
    .bind(email.to_lowercase())
    .bind(password_hash)
    .fetch_one(pool)
    .await
}

/// Find a user by email
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password_hash, profile_image, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email.to_lowercase())
    .fetch_optional(pool)
    .await
}

/// Find a user by id
pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password_hash, profile_image, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Update profile fields; `None` keeps the stored value
pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    name: Option<&str>,
    email: Option<&str>,
    profile_image: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET name = COALESCE($2, name),
            email = COALESCE($3, email),
            profile_image = COALESCE($4, profile_image)
        WHERE id = $1
        RETURNING id, name, email, password_hash, profile_image, created_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(email.map(|e| e.to_lowercase()))
    .bind(profile_image)
    .fetch_one(pool)
    .await
}
