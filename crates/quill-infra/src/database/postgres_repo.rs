//! PostgreSQL repository implementations.
//!
//! Every counter here (`post_count`, `view_count`, `like_count`,
//! `comment_count`) is mutated with a single `UPDATE ... SET c = c + delta`
//! statement so concurrent writers cannot lose an update.

use async_trait::async_trait;
use sea_orm::sea_query::{Alias, Expr, ExprTrait};
use sea_orm::{
    ColumnTrait, Condition, DbConn, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use quill_core::domain::{Comment, Post, Tag, User};
use quill_core::error::RepoError;
use quill_core::ports::{
    AuthorStats, CommentRepository, Page, PostFilter, PostRepository, TagRepository,
    UserRepository,
};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_tag::{self, Entity as PostTagEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL tag repository.
pub type PostgresTagRepository = PostgresBaseRepository<TagEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        // Mask email for logging to avoid PII in logs
        let masked = if let Some(at_pos) = email.find('@') {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = if local.len() > 1 {
                format!("{}***", &local[..1])
            } else {
                "***".to_string()
            };
            format!("{}{}", masked_local, domain)
        } else {
            "***".to_string()
        };
        tracing::debug!(user_email = %masked, "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list(&self, filter: &PostFilter) -> Result<Page<Post>, RepoError> {
        let mut query = PostEntity::find();

        if let Some(status) = filter.status {
            query = query.filter(post::Column::Status.eq(status.as_str()));
        }
        if let Some(author_id) = filter.author_id {
            query = query.filter(post::Column::AuthorId.eq(author_id));
        }
        if let Some(featured) = filter.featured {
            query = query.filter(post::Column::Featured.eq(featured));
        }
        if let Some(search) = &filter.search {
            query = query.filter(
                Condition::any()
                    .add(post::Column::Title.contains(search))
                    .add(post::Column::Content.contains(search)),
            );
        }
        if let Some(tag_slug) = &filter.tag_slug {
            query = query
                .join(JoinType::InnerJoin, post::Relation::PostTag.def())
                .join(JoinType::InnerJoin, post_tag::Relation::Tag.def())
                .filter(tag::Column::Slug.eq(tag_slug));
        }

        let page = filter.page.max(1);
        let per_page = filter.per_page.max(1);

        let paginator = query
            .order_by_desc(post::Column::CreatedAt)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await.map_err(map_db_err)?;
        let models = paginator.fetch_page(page - 1).await.map_err(map_db_err)?;

        Ok(Page {
            items: models.into_iter().map(Into::into).collect(),
            total,
            page,
            per_page,
        })
    }

    async fn tag_ids(&self, post_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let rows = PostTagEntity::find()
            .filter(post_tag::Column::PostId.eq(post_id))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(|row| row.tag_id).collect())
    }

    async fn set_tag_ids(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        PostTagEntity::delete_many()
            .filter(post_tag::Column::PostId.eq(post_id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if tag_ids.is_empty() {
            return Ok(());
        }

        let rows = tag_ids.iter().map(|tag_id| post_tag::ActiveModel {
            post_id: Set(post_id),
            tag_id: Set(*tag_id),
        });
        PostTagEntity::insert_many(rows)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(())
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError> {
        bump_post_counter(&self.db, id, post::Column::ViewCount).await
    }

    async fn increment_like_count(&self, id: Uuid) -> Result<i64, RepoError> {
        bump_post_counter(&self.db, id, post::Column::LikeCount).await?;

        let model = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        Ok(model.like_count)
    }

    async fn increment_comment_count(&self, id: Uuid) -> Result<(), RepoError> {
        bump_post_counter(&self.db, id, post::Column::CommentCount).await
    }

    async fn author_stats(&self, author_id: Uuid) -> Result<AuthorStats, RepoError> {
        let draft_count = PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .filter(post::Column::Status.eq("draft"))
            .count(&self.db)
            .await
            .map_err(map_db_err)?;
        let published_count = PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .filter(post::Column::Status.eq("published"))
            .count(&self.db)
            .await
            .map_err(map_db_err)?;

        // SUM(bigint) comes back as numeric; cast it so it decodes as i64.
        let sums: Option<(Option<i64>, Option<i64>)> = PostEntity::find()
            .select_only()
            .column_as(
                Expr::col(post::Column::ViewCount)
                    .sum()
                    .cast_as(Alias::new("BIGINT")),
                "total_views",
            )
            .column_as(
                Expr::col(post::Column::LikeCount)
                    .sum()
                    .cast_as(Alias::new("BIGINT")),
                "total_likes",
            )
            .filter(post::Column::AuthorId.eq(author_id))
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        let (total_views, total_likes) = sums.unwrap_or((None, None));

        Ok(AuthorStats {
            draft_count,
            published_count,
            total_views: total_views.unwrap_or(0),
            total_likes: total_likes.unwrap_or(0),
        })
    }

    async fn recent_by_author(&self, author_id: Uuid, limit: u64) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .order_by_desc(post::Column::UpdatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}

/// `UPDATE posts SET <col> = <col> + 1 WHERE id = $1` - one statement.
async fn bump_post_counter(db: &DbConn, id: Uuid, column: post::Column) -> Result<(), RepoError> {
    let result = PostEntity::update_many()
        .col_expr(column, Expr::col(column).add(1))
        .filter(post::Column::Id.eq(id))
        .exec(db)
        .await
        .map_err(map_db_err)?;

    if result.rows_affected == 0 {
        return Err(RepoError::NotFound);
    }

    Ok(())
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>, RepoError> {
        let result = TagEntity::find()
            .filter(tag::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        let result = TagEntity::find()
            .filter(tag::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Tag>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = TagEntity::find()
            .filter(tag::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list(&self) -> Result<Vec<Tag>, RepoError> {
        let models = TagEntity::find()
            .order_by_desc(tag::Column::PostCount)
            .order_by_asc(tag::Column::Name)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn adjust_post_count(&self, id: Uuid, delta: i64) -> Result<(), RepoError> {
        let result = TagEntity::update_many()
            .col_expr(
                tag::Column::PostCount,
                Expr::col(tag::Column::PostCount).add(delta),
            )
            .filter(tag::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(
        &self,
        post_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<Page<Comment>, RepoError> {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let paginator = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::CreatedAt)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await.map_err(map_db_err)?;
        let models = paginator.fetch_page(page - 1).await.map_err(map_db_err)?;

        Ok(Page {
            items: models.into_iter().map(Into::into).collect(),
            total,
            page,
            per_page,
        })
    }
}
