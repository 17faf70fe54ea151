/// Data models for the blog service
///
/// Row structs map directly onto the database tables; view structs are
/// the serialized shapes the API exposes (camelCase, joined authors,
/// absolute image URLs).
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Never serialized: the row carries `password_hash`, which must not
/// reach the wire. Handlers build their own response shapes.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub post_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Author identity as exposed alongside posts and comments
#[derive(Debug, Clone, Serialize)]
pub struct AuthorView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A comment joined with its author
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorView,
}

/// A post joined with its author and comments, image resolved to an
/// absolute URL
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorView,
    pub comments: Vec<CommentView>,
    pub post_image: String,
}

/// Paging metadata returned with every listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingMetadata {
    pub total_posts: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn comment_row_serializes_camel_case() {
        let comment = Comment {
            id: Uuid::new_v4(),
            content: "nice".to_string(),
            author_id: Uuid::new_v4(),
            post_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&comment).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert!(keys.contains(&"createdAt"));
        assert!(keys.contains(&"authorId"));
        assert!(keys.contains(&"postId"));
        assert!(!keys.contains(&"created_at"));
    }

    #[test]
    fn post_row_serializes_camel_case() {
        let post = Post {
            id: Uuid::new_v4(),
            title: "Intro".to_string(),
            content: "hello".to_string(),
            author_id: Uuid::new_v4(),
            post_image: None,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&post).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("createdAt"));
        assert!(obj.contains_key("authorId"));
        assert!(obj.contains_key("postImage"));
    }
}
