//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, comment, comment::CommentState};
use crate::retry::RetryPolicy;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};
use tidepool_common::AppResult;

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
    retry: RetryPolicy,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            retry: RetryPolicy::default(),
        }
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        self.retry
            .run(|| model.clone().insert(self.db.as_ref()))
            .await
    }

    /// Find a comment by ID. Deleted comments are reported as absent.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        self.retry
            .run(|| {
                Comment::find_by_id(id)
                    .filter(comment::Column::State.eq(CommentState::Active))
                    .one(self.db.as_ref())
            })
            .await
    }

    /// Replace a comment's content, but only for its author.
    ///
    /// Returns the updated comment, or nothing when the comment is
    /// absent, deleted, or authored by someone else; ownership failure
    /// is indistinguishable from absence by contract.
    pub async fn update_content(
        &self,
        comment_id: &str,
        user_id: &str,
        content: &str,
    ) -> AppResult<Option<comment::Model>> {
        let updated = self
            .retry
            .run(|| {
                Comment::update_many()
                    .col_expr(comment::Column::Content, Expr::value(content))
                    .col_expr(comment::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(comment::Column::Id.eq(comment_id))
                    .filter(comment::Column::UserId.eq(user_id))
                    .filter(comment::Column::State.eq(CommentState::Active))
                    .exec_with_returning(self.db.as_ref())
            })
            .await?;

        Ok(updated.into_iter().next())
    }

    /// Logically delete a comment, but only for its author.
    pub async fn mark_deleted(&self, comment_id: &str, user_id: &str) -> AppResult<bool> {
        let result = self
            .retry
            .run(|| {
                Comment::update_many()
                    .col_expr(comment::Column::State, Expr::value(CommentState::Deleted))
                    .col_expr(comment::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(comment::Column::Id.eq(comment_id))
                    .filter(comment::Column::UserId.eq(user_id))
                    .filter(comment::Column::State.eq(CommentState::Active))
                    .exec(self.db.as_ref())
            })
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Get active comments on a post in chronological reading order.
    pub async fn find_by_post(
        &self,
        post_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<comment::Model>> {
        self.retry
            .run(|| {
                Comment::find()
                    .filter(comment::Column::PostId.eq(post_id))
                    .filter(comment::Column::State.eq(CommentState::Active))
                    .order_by_asc(comment::Column::CreatedAt)
                    .limit(limit)
                    .offset(offset)
                    .all(self.db.as_ref())
            })
            .await
    }

    /// Count active comments on a post. Always recomputed, never cached.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        self.retry
            .run(|| {
                Comment::find()
                    .filter(comment::Column::PostId.eq(post_id))
                    .filter(comment::Column::State.eq(CommentState::Active))
                    .count(self.db.as_ref())
            })
            .await
    }
}
