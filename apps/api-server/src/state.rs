//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{
    AiGenerator, FileStorage, PasswordService, RateLimiter, TagRepository, TokenService,
    UserRepository,
};
use quill_core::services::{CommentService, PostService, TagLedger};
use quill_infra::database::{
    PostgresCommentRepository, PostgresPostRepository, PostgresTagRepository,
    PostgresUserRepository, connect,
};
use quill_infra::{
    Argon2PasswordService, JwtTokenService, KeyedRateLimiter, LocalFileStorage, OpenAiConfig,
    OpenAiGenerator,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub comments: CommentService,
    pub users: Arc<dyn UserRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub token_service: Arc<dyn TokenService>,
    pub password_service: Arc<dyn PasswordService>,
    pub storage: Arc<dyn FileStorage>,
    pub auth_limiter: Arc<dyn RateLimiter>,
    pub ai: Option<Arc<dyn AiGenerator>>,
}

impl AppState {
    /// Build the application state. The store is required: without a
    /// database nothing here can honor its contract, so startup fails
    /// rather than limping along.
    pub async fn new(config: &AppConfig) -> Result<Self, String> {
        let db_config = config
            .database
            .as_ref()
            .ok_or_else(|| "DATABASE_URL is not set".to_string())?;
        let db = connect(db_config)
            .await
            .map_err(|e| format!("Failed to connect to database: {e}"))?;

        let users: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(db.clone()));
        let tags: Arc<dyn TagRepository> = Arc::new(PostgresTagRepository::new(db.clone()));
        let post_repo = Arc::new(PostgresPostRepository::new(db.clone()));
        let comment_repo = Arc::new(PostgresCommentRepository::new(db));

        let ledger = TagLedger::new(tags.clone());
        let posts = PostService::new(post_repo.clone(), users.clone(), tags.clone(), ledger);
        let comments = CommentService::new(comment_repo, post_repo, users.clone());

        let ai: Option<Arc<dyn AiGenerator>> = match OpenAiConfig::from_env() {
            Some(ai_config) => {
                tracing::info!(model = %ai_config.model, "AI generation enabled");
                Some(Arc::new(OpenAiGenerator::new(ai_config)))
            }
            None => {
                tracing::info!("AI_API_KEY not set - AI endpoints will report unavailable");
                None
            }
        };

        let storage: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(
            config.upload.dir.clone(),
            config.upload.public_prefix.clone(),
        ));

        tracing::info!("Application state initialized");

        Ok(Self {
            posts,
            comments,
            users,
            tags,
            token_service: Arc::new(JwtTokenService::from_env()),
            password_service: Arc::new(Argon2PasswordService::new()),
            storage,
            auth_limiter: Arc::new(KeyedRateLimiter::from_env()),
            ai,
        })
    }
}
