//! AI facade handlers - thin pass-throughs to the generation collaborator.

use actix_web::{HttpResponse, web};

use quill_shared::dto::{AiTextResponse, GenerateRequest, SummarizeRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/ai/summarize
pub async fn summarize(
    state: web::Data<AppState>,
    _identity: Identity,
    body: web::Json<SummarizeRequest>,
) -> AppResult<HttpResponse> {
    let generator = state
        .ai
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("AI generation is not configured".to_string()))?;

    let req = body.into_inner();
    if req.content.trim().is_empty() {
        return Err(AppError::BadRequest("content is required".to_string()));
    }

    let text = generator.summarize(&req.content).await?;

    Ok(HttpResponse::Ok().json(AiTextResponse { text }))
}

/// POST /api/ai/generate
pub async fn generate(
    state: web::Data<AppState>,
    _identity: Identity,
    body: web::Json<GenerateRequest>,
) -> AppResult<HttpResponse> {
    let generator = state
        .ai
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("AI generation is not configured".to_string()))?;

    let req = body.into_inner();
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }
    let tone = req.tone.unwrap_or_else(|| "informative".to_string());

    let text = generator
        .generate_draft(&req.title, &tone, &req.keywords)
        .await?;

    Ok(HttpResponse::Ok().json(AiTextResponse { text }))
}
