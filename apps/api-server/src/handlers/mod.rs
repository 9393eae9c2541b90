//! HTTP handlers and route configuration.

mod ai;
mod auth;
mod comments;
mod dashboard;
mod health;
mod posts;
mod tags;
mod uploads;

use std::sync::Arc;

use actix_web::web;

use quill_core::domain::{Tag, User};
use quill_core::ports::RateLimiter;
use quill_core::services::{CommentDetail, PostDetail};
use quill_shared::dto::{AuthorResponse, CommentResponse, PostResponse, TagResponse};

use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes. The auth endpoints sit behind the
/// per-IP rate limiter.
pub fn configure_routes(cfg: &mut web::ServiceConfig, auth_limiter: Arc<dyn RateLimiter>) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .wrap(RateLimitMiddleware::new(auth_limiter))
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            // Posts
            .service(
                web::scope("/posts")
                    .service(
                        web::resource("")
                            .route(web::get().to(posts::list))
                            .route(web::post().to(posts::create)),
                    )
                    .service(web::resource("/{id}/like").route(web::post().to(posts::like)))
                    .service(
                        web::resource("/{id}/comments")
                            .route(web::get().to(comments::list))
                            .route(web::post().to(comments::create)),
                    )
                    .service(
                        web::resource("/{id_or_slug}")
                            .route(web::get().to(posts::get))
                            .route(web::put().to(posts::update))
                            .route(web::delete().to(posts::delete)),
                    ),
            )
            // Tags
            .service(
                web::scope("/tags")
                    .route("", web::get().to(tags::list))
                    .route("/{slug}", web::get().to(tags::get)),
            )
            // Uploads
            .route("/uploads", web::post().to(uploads::upload))
            // AI facade
            .service(
                web::scope("/ai")
                    .route("/summarize", web::post().to(ai::summarize))
                    .route("/generate", web::post().to(ai::generate)),
            )
            // Author dashboard
            .route("/dashboard", web::get().to(dashboard::dashboard)),
    );
}

pub(crate) fn author_response(user: &User) -> AuthorResponse {
    AuthorResponse {
        id: user.id,
        username: user.username.clone(),
    }
}

pub(crate) fn tag_response(tag: Tag) -> TagResponse {
    TagResponse {
        id: tag.id,
        name: tag.name,
        slug: tag.slug,
        color: tag.color,
        post_count: tag.post_count,
    }
}

pub(crate) fn post_response(detail: PostDetail) -> PostResponse {
    let PostDetail { post, author, tags } = detail;

    PostResponse {
        id: post.id,
        title: post.title,
        slug: post.slug,
        content: post.content,
        excerpt: post.excerpt,
        cover_image_path: post.cover_image_path,
        status: post.status.as_str().to_string(),
        featured: post.featured,
        seo_title: post.seo_title,
        seo_description: post.seo_description,
        view_count: post.view_count,
        like_count: post.like_count,
        comment_count: post.comment_count,
        published_at: post.published_at,
        created_at: post.created_at,
        updated_at: post.updated_at,
        author: author_response(&author),
        tags: tags.into_iter().map(tag_response).collect(),
    }
}

pub(crate) fn comment_response(detail: CommentDetail) -> CommentResponse {
    CommentResponse {
        id: detail.comment.id,
        post_id: detail.comment.post_id,
        content: detail.comment.content,
        created_at: detail.comment.created_at,
        author: author_response(&detail.author),
    }
}
