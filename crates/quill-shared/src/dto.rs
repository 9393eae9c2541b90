//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request to create a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: Option<String>,
    pub cover_image_path: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub featured: Option<bool>,
}

/// Request to update a post; omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<String>,
    pub cover_image_path: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub featured: Option<bool>,
}

/// Post author as embedded in post/comment responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub id: Uuid,
    pub username: String,
}

/// Tag as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub color: String,
    pub post_count: i64,
}

/// Post as returned by the API, expanded with author and tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image_path: Option<String>,
    pub status: String,
    pub featured: bool,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: AuthorResponse,
    pub tags: Vec<TagResponse>,
}

/// Query parameters accepted by the post listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub status: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// A page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Request to add a comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

/// Comment as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorResponse,
}

/// Query parameters for comment listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Response after liking a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub like_count: i64,
}

/// Response after a successful file upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub path: String,
}

/// Request to summarize post content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub content: String,
}

/// Request to draft post content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub title: String,
    pub tone: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Response from the AI endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiTextResponse {
    pub text: String,
}

/// Author dashboard payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub draft_count: u64,
    pub published_count: u64,
    pub total_views: i64,
    pub total_likes: i64,
    pub recent_posts: Vec<PostResponse>,
    pub tags: Vec<TagResponse>,
}
