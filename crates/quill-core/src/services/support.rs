//! In-memory port implementations backing the service tests.
//!
//! `adjust_post_count` and the post counter increments mutate under a
//! single lock acquisition, mirroring the atomic-delta contract of the
//! real store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, Post, Tag, User};
use crate::error::RepoError;
use crate::ports::{
    AuthorStats, BaseRepository, CommentRepository, Page, PostFilter, PostRepository,
    TagRepository, UserRepository,
};
use crate::services::{CommentService, PostService, TagLedger};

#[derive(Default)]
pub struct MemoryTags {
    rows: Mutex<HashMap<Uuid, Tag>>,
}

impl MemoryTags {
    pub fn count_for(&self, name: &str) -> Option<i64> {
        self.rows
            .lock()
            .unwrap()
            .values()
            .find(|t| t.name == name)
            .map(|t| t.post_count)
    }

    pub fn tag_total(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl BaseRepository<Tag, Uuid> for MemoryTags {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tag>, RepoError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn insert(&self, tag: Tag) -> Result<Tag, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|t| t.name == tag.name) {
            return Err(RepoError::Constraint("tags_name_key".to_string()));
        }
        rows.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn update(&self, tag: Tag) -> Result<Tag, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        if !rows.contains_key(&tag.id) {
            return Err(RepoError::NotFound);
        }
        rows.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.rows
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl TagRepository for MemoryTags {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>, RepoError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|t| t.slug == slug)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Tag>, RepoError> {
        let rows = self.rows.lock().unwrap();
        Ok(ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
    }

    async fn list(&self) -> Result<Vec<Tag>, RepoError> {
        let mut tags: Vec<Tag> = self.rows.lock().unwrap().values().cloned().collect();
        tags.sort_by(|a, b| b.post_count.cmp(&a.post_count));
        Ok(tags)
    }

    async fn adjust_post_count(&self, id: Uuid, delta: i64) -> Result<(), RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let tag = rows.get_mut(&id).ok_or(RepoError::NotFound)?;
        tag.post_count += delta;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPosts {
    rows: Mutex<HashMap<Uuid, Post>>,
    memberships: Mutex<HashMap<Uuid, Vec<Uuid>>>,
}

impl MemoryPosts {
    pub fn get(&self, id: Uuid) -> Option<Post> {
        self.rows.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for MemoryPosts {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|p| p.slug == post.slug) {
            return Err(RepoError::Constraint("posts_slug_key".to_string()));
        }
        rows.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        if !rows.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }
        rows.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.memberships.lock().unwrap().remove(&id);
        self.rows
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for MemoryPosts {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|p| p.slug == slug)
            .cloned())
    }

    // Tag-slug filtering is not modeled here; no test relies on it.
    async fn list(&self, filter: &PostFilter) -> Result<Page<Post>, RepoError> {
        let mut posts: Vec<Post> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|p| filter.status.is_none_or(|s| p.status == s))
            .filter(|p| filter.author_id.is_none_or(|a| p.author_id == a))
            .filter(|p| filter.featured.is_none_or(|f| p.featured == f))
            .filter(|p| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|q| p.title.contains(q) || p.content.contains(q))
            })
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = posts.len() as u64;
        let start = ((filter.page.max(1) - 1) * filter.per_page) as usize;
        let items = posts
            .into_iter()
            .skip(start)
            .take(filter.per_page as usize)
            .collect();

        Ok(Page {
            items,
            total,
            page: filter.page,
            per_page: filter.per_page,
        })
    }

    async fn tag_ids(&self, post_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        Ok(self
            .memberships
            .lock()
            .unwrap()
            .get(&post_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_tag_ids(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        self.memberships
            .lock()
            .unwrap()
            .insert(post_id, tag_ids.to_vec());
        Ok(())
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let post = rows.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.view_count += 1;
        Ok(())
    }

    async fn increment_like_count(&self, id: Uuid) -> Result<i64, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let post = rows.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.like_count += 1;
        Ok(post.like_count)
    }

    async fn increment_comment_count(&self, id: Uuid) -> Result<(), RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let post = rows.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.comment_count += 1;
        Ok(())
    }

    async fn author_stats(&self, author_id: Uuid) -> Result<AuthorStats, RepoError> {
        let rows = self.rows.lock().unwrap();
        let mut stats = AuthorStats::default();
        for post in rows.values().filter(|p| p.author_id == author_id) {
            if post.is_published() {
                stats.published_count += 1;
            } else {
                stats.draft_count += 1;
            }
            stats.total_views += post.view_count;
            stats.total_likes += post.like_count;
        }
        Ok(stats)
    }

    async fn recent_by_author(&self, author_id: Uuid, limit: u64) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        posts.truncate(limit as usize);
        Ok(posts)
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<HashMap<Uuid, User>>,
}

#[async_trait]
impl BaseRepository<User, Uuid> for MemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        self.rows.lock().unwrap().insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        self.rows.lock().unwrap().insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.rows
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryComments {
    rows: Mutex<HashMap<Uuid, Comment>>,
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for MemoryComments {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError> {
        self.rows
            .lock()
            .unwrap()
            .insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        self.rows
            .lock()
            .unwrap()
            .insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.rows
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl CommentRepository for MemoryComments {
    async fn list_for_post(
        &self,
        post_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<Page<Comment>, RepoError> {
        let mut comments: Vec<Comment> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = comments.len() as u64;
        let start = ((page.max(1) - 1) * per_page) as usize;
        let items = comments
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }
}

/// Everything a service test needs, wired over the in-memory stores.
pub struct TestEnv {
    pub posts: Arc<MemoryPosts>,
    pub tags: Arc<MemoryTags>,
    pub users: Arc<MemoryUsers>,
    pub comments: Arc<MemoryComments>,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub author: User,
}

pub async fn test_env() -> TestEnv {
    let posts = Arc::new(MemoryPosts::default());
    let tags = Arc::new(MemoryTags::default());
    let users = Arc::new(MemoryUsers::default());
    let comments = Arc::new(MemoryComments::default());

    let author = users
        .insert(User::new(
            "author@example.com".to_string(),
            "author".to_string(),
            "hash".to_string(),
        ))
        .await
        .unwrap();

    let ledger = TagLedger::new(tags.clone());
    let post_service = PostService::new(posts.clone(), users.clone(), tags.clone(), ledger);
    let comment_service = CommentService::new(comments.clone(), posts.clone(), users.clone());

    TestEnv {
        posts,
        tags,
        users,
        comments,
        post_service,
        comment_service,
        author,
    }
}
