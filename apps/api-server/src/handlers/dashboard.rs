//! Author dashboard handler - read-only aggregation.

use actix_web::{HttpResponse, web};

use quill_shared::dto::DashboardResponse;

use crate::handlers::{post_response, tag_response};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/dashboard
pub async fn dashboard(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let (stats, recent) = state.posts.author_dashboard(identity.user_id).await?;
    let tags = state.tags.list().await?;

    Ok(HttpResponse::Ok().json(DashboardResponse {
        draft_count: stats.draft_count,
        published_count: stats.published_count,
        total_views: stats.total_views,
        total_likes: stats.total_likes,
        recent_posts: recent.into_iter().map(post_response).collect(),
        tags: tags.into_iter().map(tag_response).collect(),
    }))
}
