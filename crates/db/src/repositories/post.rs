//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, post, post::PostState};
use crate::retry::RetryPolicy;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Statement, sea_query::Expr,
};
use tidepool_common::{AppError, AppResult};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
    retry: RetryPolicy,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            retry: RetryPolicy::default(),
        }
    }

    /// Find a post by ID. Deleted posts are reported as absent.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        self.retry
            .run(|| {
                Post::find_by_id(id)
                    .filter(post::Column::State.ne(PostState::Deleted))
                    .one(self.db.as_ref())
            })
            .await
    }

    /// Find a post by ID, returning an error if absent or deleted.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Find posts by IDs (deleted posts omitted).
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<post::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        self.retry
            .run(|| {
                Post::find()
                    .filter(post::Column::Id.is_in(ids.to_vec()))
                    .filter(post::Column::State.ne(PostState::Deleted))
                    .all(self.db.as_ref())
            })
            .await
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        self.retry
            .run(|| model.clone().insert(self.db.as_ref()))
            .await
    }

    /// Get published posts by an author (newest first).
    pub async fn find_published_by_author(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        self.retry
            .run(|| {
                Post::find()
                    .filter(post::Column::UserId.eq(user_id))
                    .filter(post::Column::State.eq(PostState::Published))
                    .order_by_desc(post::Column::CreatedAt)
                    .order_by_desc(post::Column::Id)
                    .limit(limit)
                    .offset(offset)
                    .all(self.db.as_ref())
            })
            .await
    }

    /// Get scheduled posts by an author, soonest first.
    pub async fn find_scheduled_by_author(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        self.retry
            .run(|| {
                Post::find()
                    .filter(post::Column::UserId.eq(user_id))
                    .filter(post::Column::State.eq(PostState::Scheduled))
                    .order_by_asc(post::Column::ScheduledAt)
                    .limit(limit)
                    .offset(offset)
                    .all(self.db.as_ref())
            })
            .await
    }

    /// Logically delete a post, but only for its author.
    ///
    /// Returns false when the post is absent, already deleted, or owned
    /// by someone else; ownership failure is indistinguishable from
    /// absence by contract.
    pub async fn mark_deleted(&self, post_id: &str, requester_id: &str) -> AppResult<bool> {
        let result = self
            .retry
            .run(|| {
                Post::update_many()
                    .col_expr(post::Column::State, Expr::value(PostState::Deleted))
                    .col_expr(post::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(post::Column::Id.eq(post_id))
                    .filter(post::Column::UserId.eq(requester_id))
                    .filter(post::Column::State.ne(PostState::Deleted))
                    .exec(self.db.as_ref())
            })
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Promote every scheduled post whose time has come, returning the
    /// promoted set.
    ///
    /// Selection and state flip are a single statement, so a due post is
    /// promoted exactly once even with concurrent callers. Publication
    /// refreshes `created_at`: a promoted post ranks by publication time
    /// in feeds.
    pub async fn promote_due(&self) -> AppResult<Vec<post::Model>> {
        self.retry
            .run(|| {
                Post::find()
                    .from_raw_sql(Statement::from_string(
                        DbBackend::Postgres,
                        r#"UPDATE "post"
                           SET "state" = 'published', "created_at" = NOW(), "updated_at" = NOW()
                           WHERE "state" = 'scheduled' AND "scheduled_at" <= NOW()
                           RETURNING *"#,
                    ))
                    .all(self.db.as_ref())
            })
            .await
    }

    /// Get the feed source set: published posts by any of the given
    /// authors, newest first with the ID as deterministic tiebreaker.
    pub async fn find_feed(
        &self,
        author_ids: &[String],
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        if author_ids.is_empty() {
            return Ok(vec![]);
        }

        self.retry
            .run(|| {
                Post::find()
                    .filter(post::Column::UserId.is_in(author_ids.to_vec()))
                    .filter(post::Column::State.eq(PostState::Published))
                    .order_by_desc(post::Column::CreatedAt)
                    .order_by_desc(post::Column::Id)
                    .limit(limit)
                    .offset(offset)
                    .all(self.db.as_ref())
            })
            .await
    }
}
