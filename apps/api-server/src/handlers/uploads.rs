//! Cover image upload handler.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures::{StreamExt, TryStreamExt};

use quill_shared::dto::UploadResponse;

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// POST /api/uploads
///
/// Accepts a multipart `file` field carrying an image and returns the
/// stored public path for use as a post's cover image.
pub async fn upload(
    state: web::Data<AppState>,
    _identity: Identity,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart payload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let is_image = field
            .content_type()
            .map(|mime| mime.type_() == "image")
            .unwrap_or(false);
        if !is_image {
            return Err(AppError::BadRequest(
                "only image uploads are accepted".to_string(),
            ));
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or("upload.bin")
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("upload stream failed: {e}")))?;
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::BadRequest(
                    "upload exceeds the 5 MiB limit".to_string(),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        if bytes.is_empty() {
            return Err(AppError::BadRequest("uploaded file is empty".to_string()));
        }

        let path = state.storage.store(&filename, &bytes).await?;

        return Ok(HttpResponse::Created().json(UploadResponse { path }));
    }

    Err(AppError::BadRequest(
        "multipart payload is missing a 'file' field".to_string(),
    ))
}
