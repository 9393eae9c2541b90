//! Tag handlers - read-only; tags are created lazily by post writes.

use actix_web::{HttpResponse, web};

use crate::handlers::tag_response;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/tags
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let tags = state.tags.list().await?;

    Ok(HttpResponse::Ok().json(tags.into_iter().map(tag_response).collect::<Vec<_>>()))
}

/// GET /api/tags/{slug}
pub async fn get(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let slug = path.into_inner();

    let tag = state
        .tags
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tag {slug} not found")))?;

    Ok(HttpResponse::Ok().json(tag_response(tag)))
}
