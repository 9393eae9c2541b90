use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use quill_core::domain::Post;
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, TagRepository};

use crate::database::entity::{post, tag};
use crate::database::postgres_repo::{PostgresPostRepository, PostgresTagRepository};

fn post_model(id: Uuid, author_id: Uuid) -> post::Model {
    let now = Utc::now();
    post::Model {
        id,
        author_id,
        title: "Test Post".to_owned(),
        slug: "test-post".to_owned(),
        content: "Content long enough".to_owned(),
        excerpt: None,
        cover_image_path: None,
        status: "published".to_owned(),
        featured: false,
        seo_title: None,
        seo_description: None,
        view_count: 3,
        like_count: 1,
        comment_count: 0,
        published_at: Some(now.into()),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[tokio::test]
async fn find_post_by_id_maps_to_domain() {
    let post_id = Uuid::new_v4();
    let author_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(post_id, author_id)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.id, post_id);
    assert_eq!(post.slug, "test-post");
    assert!(post.is_published());
}

#[tokio::test]
async fn adjust_post_count_issues_a_single_delta_update() {
    let tag_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let repo = PostgresTagRepository::new(db);
    repo.adjust_post_count(tag_id, -1).await.unwrap();

    let log = repo.db.into_transaction_log();
    assert_eq!(log.len(), 1);
    let stmt = format!("{:?}", log[0]);
    assert!(
        stmt.contains("\"post_count\" = \"post_count\" + "),
        "expected atomic delta update, got: {stmt}"
    );
}

#[tokio::test]
async fn adjust_post_count_on_missing_tag_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresTagRepository::new(db);

    let result = repo.adjust_post_count(Uuid::new_v4(), 1).await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn find_tag_by_name_maps_to_domain() {
    let tag_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![tag::Model {
            id: tag_id,
            name: "rust".to_owned(),
            slug: "rust".to_owned(),
            color: "#aabbcc".to_owned(),
            post_count: 4,
            created_at: Utc::now().into(),
        }]])
        .into_connection();

    let repo = PostgresTagRepository::new(db);

    let tag = repo.find_by_name("rust").await.unwrap().unwrap();
    assert_eq!(tag.id, tag_id);
    assert_eq!(tag.post_count, 4);
}
