//! AI content generation port.
//!
//! The platform treats the generation service as an optional collaborator:
//! when it is down or unconfigured the feature is simply unavailable, with
//! no retry and no fallback content.

use async_trait::async_trait;

/// Text generation service backing the summarize / draft endpoints.
#[async_trait]
pub trait AiGenerator: Send + Sync {
    /// Produce a short summary of the given post content.
    async fn summarize(&self, text: &str) -> Result<String, AiError>;

    /// Draft post content for a title, in a tone, around keywords.
    async fn generate_draft(
        &self,
        title: &str,
        tone: &str,
        keywords: &[String],
    ) -> Result<String, AiError>;
}

/// AI collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI service unavailable: {0}")]
    Unavailable(String),

    #[error("AI service returned an unusable response: {0}")]
    InvalidResponse(String),
}
