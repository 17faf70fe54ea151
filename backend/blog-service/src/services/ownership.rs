/// Ownership checks for posts and comments
///
/// Pure predicates invoked after resource lookup and before any
/// mutation is applied; "not found" is the caller's concern and must be
/// decided first so 404 and 403 stay distinct.
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Comment, Post};

/// The single canonical author comparison. Both sides are typed ids, so
/// representation drift between populated and raw references cannot
/// weaken the check.
pub fn owns(author_id: Uuid, acting_id: Uuid) -> bool {
    author_id == acting_id
}

/// Allow a post mutation only for its author
pub fn check_post_ownership(user_id: Uuid, post: &Post) -> Result<(), AppError> {
    if owns(post.author_id, user_id) {
        Ok(())
    } else {
        Err(AppError::Authorization("Unauthorized".to_string()))
    }
}

/// Allow a comment mutation only for its author
pub fn check_comment_ownership(user_id: Uuid, comment: &Comment) -> Result<(), AppError> {
    if owns(comment.author_id, user_id) {
        Ok(())
    } else {
        Err(AppError::Authorization("Unauthorized".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post_by(author_id: Uuid) -> Post {
        Post {
            id: Uuid::new_v4(),
            title: "Intro".to_string(),
            content: "hello".to_string(),
            author_id,
            post_image: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn author_is_allowed() {
        let author = Uuid::new_v4();
        assert!(check_post_ownership(author, &post_by(author)).is_ok());
    }

    #[test]
    fn non_author_is_denied() {
        let author = Uuid::new_v4();
        let other = Uuid::new_v4();
        let err = check_post_ownership(other, &post_by(author)).unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[test]
    fn comment_ownership_follows_the_same_rule() {
        let author = Uuid::new_v4();
        let comment = Comment {
            id: Uuid::new_v4(),
            content: "nice".to_string(),
            author_id: author,
            post_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        assert!(check_comment_ownership(author, &comment).is_ok());
        assert!(check_comment_ownership(Uuid::new_v4(), &comment).is_err());
    }
}
