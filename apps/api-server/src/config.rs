//! Application configuration loaded from environment variables.

use std::env;

use quill_infra::database::DatabaseConfig;

/// Where uploads land on disk and how their public paths are prefixed.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: String,
    pub public_prefix: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub upload: UploadConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
            min_connections: env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        });

        let upload = UploadConfig {
            dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            public_prefix: env::var("UPLOAD_PUBLIC_PREFIX")
                .unwrap_or_else(|_| "/uploads".to_string()),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database,
            upload,
        }
    }
}
