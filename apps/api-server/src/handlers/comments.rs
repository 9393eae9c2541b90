//! Comment handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_shared::dto::{CommentListQuery, CreateCommentRequest, PageMeta, PaginatedResponse};

use crate::handlers::comment_response;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/posts/{id}/comments
pub async fn list(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<CommentListQuery>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let query = query.into_inner();

    let page = state
        .comments
        .list(
            post_id,
            query.page.unwrap_or(1).max(1),
            query.per_page.unwrap_or(20).clamp(1, 100),
        )
        .await?;

    Ok(HttpResponse::Ok().json(PaginatedResponse {
        data: page
            .items
            .into_iter()
            .map(comment_response)
            .collect::<Vec<_>>(),
        meta: PageMeta {
            total: page.total,
            page: page.page,
            per_page: page.per_page,
        },
    }))
}

/// POST /api/posts/{id}/comments
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;

    let detail = state
        .comments
        .add(post_id, identity.user_id, body.into_inner().content)
        .await?;

    Ok(HttpResponse::Created().json(comment_response(detail)))
}

fn parse_post_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("invalid post id".to_string()))
}
