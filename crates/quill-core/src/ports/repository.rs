use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Comment, Post, PostStatus, Tag, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Persist a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Persist changes to an existing entity.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Filter and paging options for post listings.
#[derive(Debug, Clone)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub author_id: Option<Uuid>,
    pub tag_slug: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub page: u64,
    pub per_page: u64,
}

impl Default for PostFilter {
    fn default() -> Self {
        Self {
            status: None,
            author_id: None,
            tag_slug: None,
            search: None,
            featured: None,
            page: 1,
            per_page: 10,
        }
    }
}

/// One page of results plus the total matching row count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Aggregates backing the author dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthorStats {
    pub draft_count: u64,
    pub published_count: u64,
    pub total_views: i64,
    pub total_likes: i64,
}

/// User repository with domain-specific lookups.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Find a user by their username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository.
///
/// The `increment_*` operations are single-statement atomic deltas at the
/// store: two requests racing on the same counter must both land.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    async fn list(&self, filter: &PostFilter) -> Result<Page<Post>, RepoError>;

    /// Ids of the tags currently attached to a post.
    async fn tag_ids(&self, post_id: Uuid) -> Result<Vec<Uuid>, RepoError>;

    /// Replace a post's tag attachments with exactly `tag_ids`.
    async fn set_tag_ids(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError>;

    async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError>;

    /// Returns the like count after the increment.
    async fn increment_like_count(&self, id: Uuid) -> Result<i64, RepoError>;

    async fn increment_comment_count(&self, id: Uuid) -> Result<(), RepoError>;

    async fn author_stats(&self, author_id: Uuid) -> Result<AuthorStats, RepoError>;

    async fn recent_by_author(&self, author_id: Uuid, limit: u64) -> Result<Vec<Post>, RepoError>;
}

/// Tag repository.
#[async_trait]
pub trait TagRepository: BaseRepository<Tag, Uuid> {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Tag>, RepoError>;

    async fn list(&self) -> Result<Vec<Tag>, RepoError>;

    /// Atomically add `delta` to a tag's `post_count` in a single store
    /// operation. Callers never read-modify-write this counter.
    async fn adjust_post_count(&self, id: Uuid, delta: i64) -> Result<(), RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    async fn list_for_post(
        &self,
        post_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<Page<Comment>, RepoError>;
}
