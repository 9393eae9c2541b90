//! Post lifecycle service.
//!
//! The only component allowed to create, mutate, or delete a post. It
//! enforces ownership, validation, the `published_at` transition, and
//! routes every tag-set change through the tag ledger so the post-count
//! invariant is maintained in one place.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{Post, PostStatus, Tag, User};
use crate::error::{DomainError, FieldError, RepoError};
use crate::ports::{AuthorStats, Page, PostFilter, PostRepository, TagRepository, UserRepository};
use crate::services::TagLedger;

/// A post expanded with its author and tags for display.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    pub author: User,
    pub tags: Vec<Tag>,
}

/// Fields accepted when creating a post.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub tag_names: Vec<String>,
    /// Raw wire value; validated to `draft`/`published`, defaults to draft.
    pub status: Option<String>,
    pub cover_image_path: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub featured: Option<bool>,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub tag_names: Option<Vec<String>>,
    pub status: Option<String>,
    pub cover_image_path: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    tags: Arc<dyn TagRepository>,
    ledger: TagLedger,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        tags: Arc<dyn TagRepository>,
        ledger: TagLedger,
    ) -> Self {
        Self {
            posts,
            users,
            tags,
            ledger,
        }
    }

    /// Create a post owned by `author_id`.
    pub async fn create(&self, author_id: Uuid, input: NewPost) -> Result<PostDetail, DomainError> {
        let mut errors = Vec::new();

        let title = input.title.trim().to_string();
        validate_title(&title, &mut errors);
        validate_content(&input.content, &mut errors);
        let status = match input.status.as_deref() {
            None => PostStatus::Draft,
            Some(raw) => parse_status(raw, &mut errors),
        };
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let tags = self.ledger.resolve(&input.tag_names).await?;
        let slug = self.unique_slug(&title).await?;

        let mut post = Post::new(author_id, title, slug, input.content, status);
        post.excerpt = input.excerpt;
        post.cover_image_path = input.cover_image_path;
        post.seo_title = input.seo_title;
        post.seo_description = input.seo_description;
        post.featured = input.featured.unwrap_or(false);

        let post = self.posts.insert(post).await?;

        let tag_ids: Vec<Uuid> = tags.iter().map(|t| t.id).collect();
        self.posts.set_tag_ids(post.id, &tag_ids).await?;
        self.ledger.apply_membership_change(&[], &tag_ids).await?;

        self.expand(post).await
    }

    /// Update a post; only its author may do so. Unsupplied fields keep
    /// their previous values.
    pub async fn update(
        &self,
        post_id: Uuid,
        requester_id: Uuid,
        patch: PostPatch,
    ) -> Result<PostDetail, DomainError> {
        let mut post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;
        if post.author_id != requester_id {
            return Err(DomainError::Forbidden("only the author may modify a post"));
        }

        let mut errors = Vec::new();
        let title = patch.title.map(|t| t.trim().to_string());
        if let Some(title) = &title {
            validate_title(title, &mut errors);
        }
        if let Some(content) = &patch.content {
            validate_content(content, &mut errors);
        }
        let status = patch
            .status
            .as_deref()
            .map(|raw| parse_status(raw, &mut errors));
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        // The old membership must be read before any write touches it; the
        // delta is computed against this snapshot.
        let old_tag_ids = self.posts.tag_ids(post.id).await?;
        let new_tags = match &patch.tag_names {
            Some(names) => Some(self.ledger.resolve(names).await?),
            None => None,
        };

        if let Some(title) = title {
            post.title = title;
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        if let Some(excerpt) = patch.excerpt {
            post.excerpt = Some(excerpt);
        }
        if let Some(path) = patch.cover_image_path {
            post.cover_image_path = Some(path);
        }
        if let Some(seo_title) = patch.seo_title {
            post.seo_title = Some(seo_title);
        }
        if let Some(seo_description) = patch.seo_description {
            post.seo_description = Some(seo_description);
        }
        if let Some(featured) = patch.featured {
            post.featured = featured;
        }
        if let Some(status) = status {
            if status == PostStatus::Published && post.published_at.is_none() {
                post.published_at = Some(Utc::now());
            }
            post.status = status;
        }
        post.updated_at = Utc::now();

        let post = self.posts.update(post).await?;

        if let Some(tags) = new_tags {
            let new_ids: Vec<Uuid> = tags.iter().map(|t| t.id).collect();
            self.posts.set_tag_ids(post.id, &new_ids).await?;
            self.ledger
                .apply_membership_change(&old_tag_ids, &new_ids)
                .await?;
        }

        self.expand(post).await
    }

    /// Delete a post; only its author may do so.
    ///
    /// Tag counts are released before the post row is removed: a crash
    /// between the two writes leaves an orphan post rather than
    /// undercounted tags.
    pub async fn delete(&self, post_id: Uuid, requester_id: Uuid) -> Result<(), DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;
        if post.author_id != requester_id {
            return Err(DomainError::Forbidden("only the author may delete a post"));
        }

        let tag_ids = self.posts.tag_ids(post.id).await?;
        self.ledger.release_all(&tag_ids).await?;
        self.posts.delete(post.id).await?;

        Ok(())
    }

    /// Count one read of a published post. Drafts are returned untouched.
    pub async fn record_view(&self, post_id: Uuid) -> Result<Post, DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;

        if post.is_published() {
            self.posts.increment_view_count(post.id).await?;
        }

        Ok(post)
    }

    /// Like a published post; returns the new like count. Repeated likes
    /// by the same user keep counting - there is no dedup.
    pub async fn like(&self, post_id: Uuid) -> Result<i64, DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;

        // Drafts are invisible to the like endpoint.
        if !post.is_published() {
            return Err(DomainError::not_found("post", post_id));
        }

        Ok(self.posts.increment_like_count(post.id).await?)
    }

    /// Fetch a post by id or slug, expanded with author and tags.
    pub async fn get(&self, id_or_slug: &str) -> Result<PostDetail, DomainError> {
        let post = match Uuid::parse_str(id_or_slug) {
            Ok(id) => self.posts.find_by_id(id).await?,
            Err(_) => self.posts.find_by_slug(id_or_slug).await?,
        }
        .ok_or_else(|| DomainError::not_found("post", id_or_slug))?;

        self.expand(post).await
    }

    /// List posts matching the filter, each expanded for display.
    pub async fn list(&self, filter: PostFilter) -> Result<Page<PostDetail>, DomainError> {
        let page = self.posts.list(&filter).await?;

        let mut items = Vec::with_capacity(page.items.len());
        for post in page.items {
            items.push(self.expand(post).await?);
        }

        Ok(Page {
            items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
        })
    }

    /// Aggregates and recent posts for the author dashboard.
    pub async fn author_dashboard(
        &self,
        author_id: Uuid,
    ) -> Result<(AuthorStats, Vec<PostDetail>), DomainError> {
        let stats = self.posts.author_stats(author_id).await?;
        let recent = self.posts.recent_by_author(author_id, 5).await?;

        let mut details = Vec::with_capacity(recent.len());
        for post in recent {
            details.push(self.expand(post).await?);
        }

        Ok((stats, details))
    }

    async fn expand(&self, post: Post) -> Result<PostDetail, DomainError> {
        let author = self
            .users
            .find_by_id(post.author_id)
            .await?
            .ok_or_else(|| RepoError::Query(format!("post {} has no author row", post.id)))?;
        let tag_ids = self.posts.tag_ids(post.id).await?;
        let tags = self.tags.find_by_ids(&tag_ids).await?;

        Ok(PostDetail { post, author, tags })
    }

    /// Derive a slug from the title, suffixing on collision. Slugs are
    /// assigned once at creation and never regenerated.
    async fn unique_slug(&self, title: &str) -> Result<String, RepoError> {
        let base = slug::slugify(title);
        let base = if base.is_empty() {
            "post".to_string()
        } else {
            base
        };

        let mut candidate = base.clone();
        let mut n = 2;
        while self.posts.find_by_slug(&candidate).await?.is_some() {
            candidate = format!("{base}-{n}");
            n += 1;
        }

        Ok(candidate)
    }
}

fn validate_title(title: &str, errors: &mut Vec<FieldError>) {
    let len = title.chars().count();
    if !(3..=200).contains(&len) {
        errors.push(FieldError::new(
            "title",
            "title must be between 3 and 200 characters",
        ));
    }
}

fn validate_content(content: &str, errors: &mut Vec<FieldError>) {
    if content.chars().count() < 10 {
        errors.push(FieldError::new(
            "content",
            "content must be at least 10 characters",
        ));
    }
}

fn parse_status(raw: &str, errors: &mut Vec<FieldError>) -> PostStatus {
    PostStatus::parse(raw).unwrap_or_else(|| {
        errors.push(FieldError::new(
            "status",
            "status must be 'draft' or 'published'",
        ));
        PostStatus::Draft
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::support::{TestEnv, test_env};

    fn input(title: &str, tags: &[&str], status: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "long enough content".to_string(),
            tag_names: tags.iter().map(|t| t.to_string()).collect(),
            status: Some(status.to_string()),
            ..NewPost::default()
        }
    }

    async fn published_post(env: &TestEnv, title: &str, tags: &[&str]) -> PostDetail {
        env.post_service
            .create(env.author.id, input(title, tags, "published"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_with_fresh_tag_creates_it_with_count_one() {
        let env = test_env().await;

        let detail = published_post(&env, "First post", &["rust"]).await;

        assert_eq!(detail.tags.len(), 1);
        assert_eq!(detail.tags[0].name, "rust");
        assert_eq!(env.tags.count_for("rust"), Some(1));
        assert_eq!(env.tags.tag_total(), 1);
    }

    #[tokio::test]
    async fn create_folds_tag_case_and_whitespace() {
        let env = test_env().await;

        let detail = published_post(&env, "Go time", &["Go", "go", " GO "]).await;

        assert_eq!(detail.tags.len(), 1);
        assert_eq!(detail.tags[0].name, "go");
        assert_eq!(env.tags.count_for("go"), Some(1));
        assert_eq!(env.tags.tag_total(), 1);
    }

    #[tokio::test]
    async fn create_collects_field_level_validation_errors() {
        let env = test_env().await;

        let result = env
            .post_service
            .create(
                env.author.id,
                NewPost {
                    title: "ab".to_string(),
                    content: "short".to_string(),
                    ..NewPost::default()
                },
            )
            .await;

        match result {
            Err(DomainError::Validation(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
                assert!(fields.contains(&"title"));
                assert!(fields.contains(&"content"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert_eq!(env.tags.tag_total(), 0);
    }

    #[tokio::test]
    async fn create_defaults_to_draft_without_published_at() {
        let env = test_env().await;

        let detail = env
            .post_service
            .create(env.author.id, input("Draft post", &[], "draft"))
            .await
            .unwrap();

        assert_eq!(detail.post.status, PostStatus::Draft);
        assert!(detail.post.published_at.is_none());
        assert_eq!(detail.post.view_count, 0);
        assert_eq!(detail.post.like_count, 0);
    }

    #[tokio::test]
    async fn update_tag_swap_adjusts_only_entering_and_leaving_tags() {
        let env = test_env().await;
        let detail = published_post(&env, "Swap", &["go", "rust"]).await;

        env.post_service
            .update(
                detail.post.id,
                env.author.id,
                PostPatch {
                    tag_names: Some(vec!["rust".to_string(), "python".to_string()]),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(env.tags.count_for("go"), Some(0));
        assert_eq!(env.tags.count_for("rust"), Some(1));
        assert_eq!(env.tags.count_for("python"), Some(1));
    }

    #[tokio::test]
    async fn update_with_unchanged_tags_keeps_counts() {
        let env = test_env().await;
        let detail = published_post(&env, "Stable", &["go", "rust"]).await;

        env.post_service
            .update(
                detail.post.id,
                env.author.id,
                PostPatch {
                    title: Some("Stable, retitled".to_string()),
                    tag_names: Some(vec!["go".to_string(), "rust".to_string()]),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(env.tags.count_for("go"), Some(1));
        assert_eq!(env.tags.count_for("rust"), Some(1));
    }

    #[tokio::test]
    async fn update_without_tag_list_leaves_membership_alone() {
        let env = test_env().await;
        let detail = published_post(&env, "Untouched", &["go"]).await;

        let updated = env
            .post_service
            .update(
                detail.post.id,
                env.author.id,
                PostPatch {
                    content: Some("replacement content".to_string()),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.tags.len(), 1);
        assert_eq!(env.tags.count_for("go"), Some(1));
    }

    #[tokio::test]
    async fn update_by_non_author_is_forbidden_and_changes_nothing() {
        let env = test_env().await;
        let detail = published_post(&env, "Mine", &["go"]).await;
        let intruder = Uuid::new_v4();

        let result = env
            .post_service
            .update(
                detail.post.id,
                intruder,
                PostPatch {
                    title: Some("Stolen".to_string()),
                    tag_names: Some(vec![]),
                    ..PostPatch::default()
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::Forbidden(_))));
        assert_eq!(env.posts.get(detail.post.id).unwrap().title, "Mine");
        assert_eq!(env.tags.count_for("go"), Some(1));
    }

    #[tokio::test]
    async fn first_publish_stamps_published_at_exactly_once() {
        let env = test_env().await;
        let detail = env
            .post_service
            .create(env.author.id, input("Becomes public", &[], "draft"))
            .await
            .unwrap();

        let published = env
            .post_service
            .update(
                detail.post.id,
                env.author.id,
                PostPatch {
                    status: Some("published".to_string()),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap();
        let stamp = published.post.published_at.unwrap();

        // Unpublish and republish: the original stamp survives.
        env.post_service
            .update(
                detail.post.id,
                env.author.id,
                PostPatch {
                    status: Some("draft".to_string()),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap();
        let republished = env
            .post_service
            .update(
                detail.post.id,
                env.author.id,
                PostPatch {
                    status: Some("published".to_string()),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(republished.post.published_at, Some(stamp));
    }

    #[tokio::test]
    async fn delete_releases_every_tag_count_and_removes_the_post() {
        let env = test_env().await;
        let kept = published_post(&env, "Keeper", &["go"]).await;
        let doomed = published_post(&env, "Doomed", &["go", "rust"]).await;

        env.post_service
            .delete(doomed.post.id, env.author.id)
            .await
            .unwrap();

        assert_eq!(env.tags.count_for("go"), Some(1));
        assert_eq!(env.tags.count_for("rust"), Some(0));
        assert!(env.posts.get(doomed.post.id).is_none());
        assert!(env.posts.get(kept.post.id).is_some());
    }

    #[tokio::test]
    async fn delete_by_non_author_is_forbidden_and_changes_nothing() {
        let env = test_env().await;
        let detail = published_post(&env, "Protected", &["go"]).await;

        let result = env.post_service.delete(detail.post.id, Uuid::new_v4()).await;

        assert!(matches!(result, Err(DomainError::Forbidden(_))));
        assert!(env.posts.get(detail.post.id).is_some());
        assert_eq!(env.tags.count_for("go"), Some(1));
    }

    #[tokio::test]
    async fn record_view_is_a_noop_on_drafts() {
        let env = test_env().await;
        let detail = env
            .post_service
            .create(env.author.id, input("Hidden", &[], "draft"))
            .await
            .unwrap();

        let post = env.post_service.record_view(detail.post.id).await.unwrap();

        assert_eq!(post.view_count, 0);
        assert_eq!(env.posts.get(detail.post.id).unwrap().view_count, 0);
    }

    #[tokio::test]
    async fn record_view_increments_published_posts_by_one() {
        let env = test_env().await;
        let detail = published_post(&env, "Popular", &[]).await;

        env.post_service.record_view(detail.post.id).await.unwrap();
        env.post_service.record_view(detail.post.id).await.unwrap();

        assert_eq!(env.posts.get(detail.post.id).unwrap().view_count, 2);
    }

    #[tokio::test]
    async fn like_counts_repeatedly_on_published_posts() {
        let env = test_env().await;
        let detail = published_post(&env, "Liked", &[]).await;

        assert_eq!(env.post_service.like(detail.post.id).await.unwrap(), 1);
        assert_eq!(env.post_service.like(detail.post.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn like_reports_not_found_for_drafts_and_missing_posts() {
        let env = test_env().await;
        let draft = env
            .post_service
            .create(env.author.id, input("Quiet", &[], "draft"))
            .await
            .unwrap();

        assert!(matches!(
            env.post_service.like(draft.post.id).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            env.post_service.like(Uuid::new_v4()).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn colliding_titles_get_suffixed_slugs() {
        let env = test_env().await;

        let first = published_post(&env, "Same Title", &[]).await;
        let second = published_post(&env, "Same Title", &[]).await;

        assert_eq!(first.post.slug, "same-title");
        assert_eq!(second.post.slug, "same-title-2");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_creates_sharing_a_tag_lose_no_counts() {
        let env = test_env().await;
        let author = env.author.id;

        let creates = (0..8).map(|i| {
            let service = env.post_service.clone();
            tokio::spawn(async move {
                service
                    .create(author, input(&format!("Concurrent {i}"), &["shared"], "published"))
                    .await
            })
        });
        for handle in futures::future::join_all(creates).await {
            handle.unwrap().unwrap();
        }

        assert_eq!(env.tags.count_for("shared"), Some(8));
    }
}
