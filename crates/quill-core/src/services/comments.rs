//! Comment service.
//!
//! Comments attach to published posts only; each accepted comment bumps
//! the post's `comment_count` through the repository's atomic delta.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Comment, User};
use crate::error::{DomainError, FieldError, RepoError};
use crate::ports::{CommentRepository, Page, PostRepository, UserRepository};

/// A comment expanded with its author for display.
#[derive(Debug, Clone)]
pub struct CommentDetail {
    pub comment: Comment,
    pub author: User,
}

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            comments,
            posts,
            users,
        }
    }

    pub async fn add(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<CommentDetail, DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;
        if !post.is_published() {
            return Err(DomainError::not_found("post", post_id));
        }

        let content = content.trim().to_string();
        let len = content.chars().count();
        if !(1..=2000).contains(&len) {
            return Err(DomainError::Validation(vec![FieldError::new(
                "content",
                "comment must be between 1 and 2000 characters",
            )]));
        }

        let comment = self
            .comments
            .insert(Comment::new(post_id, author_id, content))
            .await?;
        self.posts.increment_comment_count(post_id).await?;

        self.expand(comment).await
    }

    pub async fn list(
        &self,
        post_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<Page<CommentDetail>, DomainError> {
        let page = self.comments.list_for_post(post_id, page, per_page).await?;

        let mut items = Vec::with_capacity(page.items.len());
        for comment in page.items {
            items.push(self.expand(comment).await?);
        }

        Ok(Page {
            items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
        })
    }

    async fn expand(&self, comment: Comment) -> Result<CommentDetail, DomainError> {
        let author = self
            .users
            .find_by_id(comment.author_id)
            .await?
            .ok_or_else(|| RepoError::Query(format!("comment {} has no author row", comment.id)))?;

        Ok(CommentDetail { comment, author })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::NewPost;
    use crate::services::support::test_env;

    async fn published(env: &crate::services::support::TestEnv) -> Uuid {
        env.post_service
            .create(
                env.author.id,
                NewPost {
                    title: "Commentable".to_string(),
                    content: "long enough content".to_string(),
                    status: Some("published".to_string()),
                    ..NewPost::default()
                },
            )
            .await
            .unwrap()
            .post
            .id
    }

    #[tokio::test]
    async fn add_bumps_the_post_comment_count() {
        let env = test_env().await;
        let post_id = published(&env).await;

        env.comment_service
            .add(post_id, env.author.id, "Nice write-up".to_string())
            .await
            .unwrap();
        env.comment_service
            .add(post_id, env.author.id, "Still good".to_string())
            .await
            .unwrap();

        assert_eq!(env.posts.get(post_id).unwrap().comment_count, 2);
    }

    #[tokio::test]
    async fn add_rejects_drafts_as_not_found() {
        let env = test_env().await;
        let draft = env
            .post_service
            .create(
                env.author.id,
                NewPost {
                    title: "Unseen".to_string(),
                    content: "long enough content".to_string(),
                    ..NewPost::default()
                },
            )
            .await
            .unwrap();

        let result = env
            .comment_service
            .add(draft.post.id, env.author.id, "First!".to_string())
            .await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        assert_eq!(env.posts.get(draft.post.id).unwrap().comment_count, 0);
    }

    #[tokio::test]
    async fn add_rejects_blank_content_with_a_field_error() {
        let env = test_env().await;
        let post_id = published(&env).await;

        let result = env
            .comment_service
            .add(post_id, env.author.id, "   ".to_string())
            .await;

        match result {
            Err(DomainError::Validation(errors)) => assert_eq!(errors[0].field, "content"),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_returns_newest_first_with_authors() {
        let env = test_env().await;
        let post_id = published(&env).await;
        env.comment_service
            .add(post_id, env.author.id, "older".to_string())
            .await
            .unwrap();
        env.comment_service
            .add(post_id, env.author.id, "newer".to_string())
            .await
            .unwrap();

        let page = env.comment_service.list(post_id, 1, 10).await.unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].author.username, "author");
    }
}
