//! Follow repository.

use std::sync::Arc;

use crate::entities::{Follow, follow};
use crate::retry::RetryPolicy;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::OnConflict,
};
use tidepool_common::AppResult;

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
    retry: RetryPolicy,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            retry: RetryPolicy::default(),
        }
    }

    /// Insert a follow edge, tolerating duplicates.
    ///
    /// Concurrent inserts for the same pair race to a single surviving
    /// row via the unique (follower, followee) constraint. Returns
    /// whether a new edge was created (false on duplicate).
    pub async fn insert_edge(&self, model: follow::ActiveModel) -> AppResult<bool> {
        let rows = self
            .retry
            .run(|| {
                Follow::insert(model.clone())
                    .on_conflict(
                        OnConflict::columns([
                            follow::Column::FollowerId,
                            follow::Column::FolloweeId,
                        ])
                        .do_nothing()
                        .to_owned(),
                    )
                    .exec_without_returning(self.db.as_ref())
            })
            .await?;

        Ok(rows > 0)
    }

    /// Remove a follow edge. Returns whether an edge existed.
    pub async fn delete_edge(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        let result = self
            .retry
            .run(|| {
                Follow::delete_many()
                    .filter(follow::Column::FollowerId.eq(follower_id))
                    .filter(follow::Column::FolloweeId.eq(followee_id))
                    .exec(self.db.as_ref())
            })
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Check if a user is following another user.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        let edge = self
            .retry
            .run(|| {
                Follow::find()
                    .filter(follow::Column::FollowerId.eq(follower_id))
                    .filter(follow::Column::FolloweeId.eq(followee_id))
                    .one(self.db.as_ref())
            })
            .await?;

        Ok(edge.is_some())
    }

    /// Get the users a user is following (most recent edge first).
    pub async fn find_following(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<follow::Model>> {
        self.retry
            .run(|| {
                Follow::find()
                    .filter(follow::Column::FollowerId.eq(user_id))
                    .order_by_desc(follow::Column::CreatedAt)
                    .limit(limit)
                    .offset(offset)
                    .all(self.db.as_ref())
            })
            .await
    }

    /// Get the users following a user (most recent edge first).
    pub async fn find_followers(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<follow::Model>> {
        self.retry
            .run(|| {
                Follow::find()
                    .filter(follow::Column::FolloweeId.eq(user_id))
                    .order_by_desc(follow::Column::CreatedAt)
                    .limit(limit)
                    .offset(offset)
                    .all(self.db.as_ref())
            })
            .await
    }

    /// Count how many users a user is following.
    pub async fn count_following(&self, user_id: &str) -> AppResult<u64> {
        self.retry
            .run(|| {
                Follow::find()
                    .filter(follow::Column::FollowerId.eq(user_id))
                    .count(self.db.as_ref())
            })
            .await
    }

    /// Count a user's followers.
    pub async fn count_followers(&self, user_id: &str) -> AppResult<u64> {
        self.retry
            .run(|| {
                Follow::find()
                    .filter(follow::Column::FolloweeId.eq(user_id))
                    .count(self.db.as_ref())
            })
            .await
    }

    /// Get every followee ID for a user, for the feed source set.
    pub async fn following_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        self.retry
            .run(|| {
                Follow::find()
                    .select_only()
                    .column(follow::Column::FolloweeId)
                    .filter(follow::Column::FollowerId.eq(user_id))
                    .into_tuple::<String>()
                    .all(self.db.as_ref())
            })
            .await
    }
}
