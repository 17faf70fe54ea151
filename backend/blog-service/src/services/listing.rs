/// Post listing engine
///
/// Resolves a listing request into a filtered, joined, paginated result
/// set plus a total count. Posts are joined with their author, comments
/// are joined with theirs; a post or comment whose author reference no
/// longer resolves is dropped rather than errored. The count query runs
/// the exact same filter predicate as the page query - both go through
/// `push_filters` so the two can never diverge.
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AuthorView, CommentView, ListingMetadata, PostView};
use crate::services::images;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Raw query parameters as they arrive on the wire. Numerics are kept
/// as strings so malformed values fall back to defaults instead of
/// failing deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub author: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Normalized listing parameters
#[derive(Debug, Clone)]
pub struct ListingParams {
    pub author: Option<String>,
    pub search: Option<String>,
    pub sort: SortOrder,
    pub page: i64,
    pub limit: i64,
}

impl ListingParams {
    pub fn from_query(query: &ListingQuery) -> Self {
        let sort = match query.sort.as_deref() {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        };

        Self {
            author: query.author.clone().filter(|s| !s.is_empty()),
            search: query.search.clone().filter(|s| !s.is_empty()),
            sort,
            page: parse_positive(query.page.as_deref(), DEFAULT_PAGE),
            limit: parse_positive(query.limit.as_deref(), DEFAULT_LIMIT),
        }
    }

    /// Saturates instead of overflowing so an absurd but parseable page
    /// number degrades to an empty page, not a panic.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Parse a positive integer, falling back to `default` on anything
/// malformed or non-positive.
fn parse_positive(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

/// `ceil(total / limit)`; zero matches stay zero pages
pub fn total_pages(total_posts: i64, limit: i64) -> i64 {
    (total_posts + limit - 1) / limit
}

/// One page of posts plus pre-pagination metadata
#[derive(Debug)]
pub struct PostPage {
    pub posts: Vec<PostView>,
    pub metadata: ListingMetadata,
}

#[derive(Debug, sqlx::FromRow)]
struct PostListingRow {
    id: Uuid,
    title: String,
    content: String,
    post_image: Option<String>,
    created_at: DateTime<Utc>,
    author_id: Uuid,
    author_name: String,
    author_email: String,
}

#[derive(Debug, sqlx::FromRow)]
struct CommentListingRow {
    id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    post_id: Uuid,
    author_id: Uuid,
    author_name: String,
    author_email: String,
}

/// Append the AND-combined author/search predicate. Both the page query
/// and the count query call this with their own builder.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, params: &ListingParams) {
    builder.push(" WHERE TRUE");

    if let Some(author) = &params.author {
        let pattern = format!("%{}%", author);
        builder
            .push(" AND (u.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern)
            .push(" OR u.id::text = ")
            .push_bind(author.clone())
            .push(")");
    }

    if let Some(search) = &params.search {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (p.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.content ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Produce one page of posts joined with authors and comments, plus the
/// filtered pre-pagination total. Image paths are resolved to absolute
/// URLs against `base_url` after the page is assembled.
pub async fn list_posts(
    pool: &PgPool,
    params: &ListingParams,
    base_url: &str,
) -> Result<PostPage> {
    let mut page_query = QueryBuilder::new(
        "SELECT p.id, p.title, p.content, p.post_image, p.created_at, \
         u.id AS author_id, u.name AS author_name, u.email AS author_email \
         FROM posts p INNER JOIN users u ON u.id = p.author_id",
    );
    push_filters(&mut page_query, params);
    let order = params.sort.sql();
    page_query.push(format!(" ORDER BY p.created_at {order}, p.id {order}"));
    page_query
        .push(" LIMIT ")
        .push_bind(params.limit)
        .push(" OFFSET ")
        .push_bind(params.offset());

    let rows: Vec<PostListingRow> = page_query.build_query_as().fetch_all(pool).await?;

    let mut count_query = QueryBuilder::new(
        "SELECT COUNT(*) FROM posts p INNER JOIN users u ON u.id = p.author_id",
    );
    push_filters(&mut count_query, params);
    let total_posts: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    let post_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut comments_by_post = comments_for_posts(pool, &post_ids).await?;

    let posts = rows
        .into_iter()
        .map(|row| PostView {
            id: row.id,
            title: row.title,
            content: row.content,
            created_at: row.created_at,
            author: AuthorView {
                id: row.author_id,
                name: row.author_name,
                email: row.author_email,
            },
            comments: comments_by_post.remove(&row.id).unwrap_or_default(),
            post_image: images::absolute_image_url(base_url, row.post_image.as_deref()),
        })
        .collect();

    Ok(PostPage {
        posts,
        metadata: ListingMetadata {
            total_posts,
            current_page: params.page,
            total_pages: total_pages(total_posts, params.limit),
        },
    })
}

/// Fetch the comments of the given posts, newest first, each joined
/// with its author, grouped by post id.
pub async fn comments_for_posts(
    pool: &PgPool,
    post_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<CommentView>>> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<CommentListingRow> = sqlx::query_as(
        r#"
        SELECT c.id, c.content, c.created_at, c.post_id,
               u.id AS author_id, u.name AS author_name, u.email AS author_email
        FROM comments c INNER JOIN users u ON u.id = c.author_id
        WHERE c.post_id = ANY($1)
        ORDER BY c.created_at DESC, c.id DESC
        "#,
    )
    .bind(post_ids.to_vec())
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
    for row in rows {
        grouped.entry(row.post_id).or_default().push(CommentView {
            id: row.id,
            content: row.content,
            created_at: row.created_at,
            author: AuthorView {
                id: row.author_id,
                name: row.author_name,
                email: row.author_email,
            },
        });
    }

    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(author: Option<&str>, search: Option<&str>) -> ListingQuery {
        ListingQuery {
            author: author.map(String::from),
            search: search.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_apply_to_missing_params() {
        let params = ListingParams::from_query(&ListingQuery::default());
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert_eq!(params.sort, SortOrder::Desc);
        assert!(params.author.is_none());
        assert!(params.search.is_none());
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let raw = ListingQuery {
            page: Some("abc".into()),
            limit: Some("-5".into()),
            ..Default::default()
        };
        let params = ListingParams::from_query(&raw);
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
    }

    #[test]
    fn zero_page_is_normalized_not_negative_offset() {
        let raw = ListingQuery {
            page: Some("0".into()),
            limit: Some("0".into()),
            ..Default::default()
        };
        let params = ListingParams::from_query(&raw);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn sort_asc_is_recognized_everything_else_descends() {
        let mut raw = ListingQuery::default();
        raw.sort = Some("asc".into());
        assert_eq!(ListingParams::from_query(&raw).sort, SortOrder::Asc);

        raw.sort = Some("upwards".into());
        assert_eq!(ListingParams::from_query(&raw).sort, SortOrder::Desc);
    }

    #[test]
    fn offset_is_page_minus_one_times_limit() {
        let raw = ListingQuery {
            page: Some("3".into()),
            limit: Some("10".into()),
            ..Default::default()
        };
        assert_eq!(ListingParams::from_query(&raw).offset(), 20);
    }

    #[test]
    fn huge_page_number_saturates_instead_of_overflowing() {
        let raw = ListingQuery {
            page: Some(i64::MAX.to_string()),
            limit: Some("10".into()),
            ..Default::default()
        };
        let params = ListingParams::from_query(&raw);
        assert_eq!(params.page, i64::MAX);
        assert_eq!(params.offset(), i64::MAX);
    }

    #[test]
    fn total_pages_is_ceiling_division() {
        assert_eq!(total_pages(23, 10), 3);
        assert_eq!(total_pages(20, 10), 2);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(0, 10), 0);
    }

    #[test]
    fn no_filters_matches_all() {
        let params = ListingParams::from_query(&query(None, None));
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM posts p");
        push_filters(&mut builder, &params);
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM posts p WHERE TRUE");
    }

    #[test]
    fn author_filter_is_an_or_over_name_email_id() {
        let params = ListingParams::from_query(&query(Some("Alice"), None));
        let mut builder = QueryBuilder::new("");
        push_filters(&mut builder, &params);
        let sql = builder.sql();
        assert!(sql.contains("u.name ILIKE"));
        assert!(sql.contains("OR u.email ILIKE"));
        assert!(sql.contains("OR u.id::text ="));
    }

    #[test]
    fn both_filters_compose_with_and() {
        let params = ListingParams::from_query(&query(Some("Alice"), Some("Guide")));
        let mut builder = QueryBuilder::new("");
        push_filters(&mut builder, &params);
        let sql = builder.sql();
        let author_pos = sql.find("u.name ILIKE").unwrap();
        let search_pos = sql.find("p.title ILIKE").unwrap();
        assert!(author_pos < search_pos);
        assert!(sql[author_pos..search_pos].contains(" AND ("));
    }

    #[test]
    fn page_and_count_filters_are_identical() {
        // Both queries share push_filters; the appended predicate text
        // must match regardless of the leading SELECT.
        let params = ListingParams::from_query(&query(Some("Alice"), Some("Guide")));

        let mut page = QueryBuilder::new("PAGE");
        push_filters(&mut page, &params);
        let mut count = QueryBuilder::new("COUNT");
        push_filters(&mut count, &params);

        assert_eq!(
            page.sql().strip_prefix("PAGE").unwrap(),
            count.sql().strip_prefix("COUNT").unwrap()
        );
    }

    #[test]
    fn empty_filter_strings_are_treated_as_absent() {
        let params = ListingParams::from_query(&query(Some(""), Some("")));
        assert!(params.author.is_none());
        assert!(params.search.is_none());
    }
}
