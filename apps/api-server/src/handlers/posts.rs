//! Post handlers.
//!
//! These translate HTTP into post-service calls. Eligibility decisions
//! (who may see drafts, when a view is recorded) happen here; the service
//! owns validation, ownership, and the tag-count invariant.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::PostStatus;
use quill_core::ports::PostFilter;
use quill_core::services::{NewPost, PostPatch};
use quill_shared::dto::{
    CreatePostRequest, LikeResponse, PageMeta, PaginatedResponse, PostListQuery, UpdatePostRequest,
};

use crate::handlers::post_response;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const MAX_PER_PAGE: u64 = 50;

/// GET /api/posts
///
/// Anonymous callers see published posts. An authenticated caller asking
/// for `status=draft` gets their own drafts.
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<PostListQuery>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();

    let mut filter = PostFilter {
        status: Some(PostStatus::Published),
        tag_slug: query.tag,
        search: query.search,
        featured: query.featured,
        page: query.page.unwrap_or(1).max(1),
        per_page: query.per_page.unwrap_or(10).clamp(1, MAX_PER_PAGE),
        ..PostFilter::default()
    };

    if let Some(status) = query.status.as_deref() {
        match (PostStatus::parse(status), identity.0) {
            (Some(PostStatus::Draft), Some(identity)) => {
                // Drafts are only ever listed to their author.
                filter.status = Some(PostStatus::Draft);
                filter.author_id = Some(identity.user_id);
            }
            (Some(PostStatus::Published), _) => {}
            (Some(PostStatus::Draft), None) => return Err(AppError::Unauthorized),
            (None, _) => {
                return Err(AppError::BadRequest(
                    "status must be 'draft' or 'published'".to_string(),
                ));
            }
        }
    }

    let page = state.posts.list(filter).await?;

    Ok(HttpResponse::Ok().json(PaginatedResponse {
        data: page
            .items
            .into_iter()
            .map(post_response)
            .collect::<Vec<_>>(),
        meta: PageMeta {
            total: page.total,
            page: page.page,
            per_page: page.per_page,
        },
    }))
}

/// GET /api/posts/{id_or_slug}
///
/// Reading a published post records a view. Drafts are visible only to
/// their author and look absent to everyone else.
pub async fn get(
    state: web::Data<AppState>,
    path: web::Path<String>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let id_or_slug = path.into_inner();
    let detail = state.posts.get(&id_or_slug).await?;

    if !detail.post.is_published() {
        let is_author = identity
            .0
            .map(|i| i.user_id == detail.post.author_id)
            .unwrap_or(false);
        if !is_author {
            return Err(AppError::NotFound(format!("post {id_or_slug} not found")));
        }
        return Ok(HttpResponse::Ok().json(post_response(detail)));
    }

    state.posts.record_view(detail.post.id).await?;

    Ok(HttpResponse::Ok().json(post_response(detail)))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let detail = state
        .posts
        .create(
            identity.user_id,
            NewPost {
                title: req.title,
                content: req.content,
                excerpt: req.excerpt,
                tag_names: req.tags,
                status: req.status,
                cover_image_path: req.cover_image_path,
                seo_title: req.seo_title,
                seo_description: req.seo_description,
                featured: req.featured,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(post_response(detail)))
}

/// PUT /api/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let req = body.into_inner();

    let detail = state
        .posts
        .update(
            post_id,
            identity.user_id,
            PostPatch {
                title: req.title,
                content: req.content,
                excerpt: req.excerpt,
                tag_names: req.tags,
                status: req.status,
                cover_image_path: req.cover_image_path,
                seo_title: req.seo_title,
                seo_description: req.seo_description,
                featured: req.featured,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(post_response(detail)))
}

/// DELETE /api/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;

    state.posts.delete(post_id, identity.user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/posts/{id}/like
pub async fn like(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;

    let like_count = state.posts.like(post_id).await?;

    Ok(HttpResponse::Ok().json(LikeResponse { like_count }))
}

fn parse_post_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("invalid post id".to_string()))
}
