use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    /// Parse a wire value; anything other than `draft`/`published` is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            _ => None,
        }
    }
}

/// Post entity - a content item owned by exactly one author.
///
/// Tag membership lives in the join table and is loaded separately; the
/// counters here are only ever mutated through the repository's atomic
/// delta operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image_path: Option<String>,
    pub status: PostStatus,
    pub featured: bool,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post with zeroed counters. `published_at` is stamped
    /// immediately when the post is born published.
    pub fn new(
        author_id: Uuid,
        title: String,
        slug: String,
        content: String,
        status: PostStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            slug,
            content,
            excerpt: None,
            cover_image_path: None,
            status,
            featured: false,
            seo_title: None,
            seo_description: None,
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            published_at: (status == PostStatus::Published).then(|| now),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }
}
