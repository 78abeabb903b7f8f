//! Like repository.

use std::sync::Arc;

use crate::entities::{Like, like};
use crate::retry::RetryPolicy;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::OnConflict,
};
use tidepool_common::AppResult;

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
    retry: RetryPolicy,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            retry: RetryPolicy::default(),
        }
    }

    /// Insert a like edge, tolerating duplicates.
    ///
    /// Concurrent likes from the same user race to a single surviving
    /// row via the unique (user, post) constraint. Returns whether a new
    /// edge was created (false on duplicate).
    pub async fn insert_edge(&self, model: like::ActiveModel) -> AppResult<bool> {
        let rows = self
            .retry
            .run(|| {
                Like::insert(model.clone())
                    .on_conflict(
                        OnConflict::columns([like::Column::UserId, like::Column::PostId])
                            .do_nothing()
                            .to_owned(),
                    )
                    .exec_without_returning(self.db.as_ref())
            })
            .await?;

        Ok(rows > 0)
    }

    /// Remove a like edge. Returns whether an edge existed.
    pub async fn delete_edge(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        let result = self
            .retry
            .run(|| {
                Like::delete_many()
                    .filter(like::Column::UserId.eq(user_id))
                    .filter(like::Column::PostId.eq(post_id))
                    .exec(self.db.as_ref())
            })
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Check if a user has liked a post.
    pub async fn has_liked(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        let edge = self
            .retry
            .run(|| {
                Like::find()
                    .filter(like::Column::UserId.eq(user_id))
                    .filter(like::Column::PostId.eq(post_id))
                    .one(self.db.as_ref())
            })
            .await?;

        Ok(edge.is_some())
    }

    /// Get likes on a post (most recent first).
    pub async fn find_by_post(
        &self,
        post_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<like::Model>> {
        self.retry
            .run(|| {
                Like::find()
                    .filter(like::Column::PostId.eq(post_id))
                    .order_by_desc(like::Column::CreatedAt)
                    .limit(limit)
                    .offset(offset)
                    .all(self.db.as_ref())
            })
            .await
    }

    /// Get likes made by a user (most recent first).
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<like::Model>> {
        self.retry
            .run(|| {
                Like::find()
                    .filter(like::Column::UserId.eq(user_id))
                    .order_by_desc(like::Column::CreatedAt)
                    .limit(limit)
                    .offset(offset)
                    .all(self.db.as_ref())
            })
            .await
    }

    /// Count likes on a post. Always recomputed, never cached.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        self.retry
            .run(|| {
                Like::find()
                    .filter(like::Column::PostId.eq(post_id))
                    .count(self.db.as_ref())
            })
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{ActiveValue::Set, DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_like(id: &str, user_id: &str, post_id: &str) -> like::Model {
        like::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn active_edge(id: &str, user_id: &str, post_id: &str) -> like::ActiveModel {
        like::ActiveModel {
            id: Set(id.to_string()),
            user_id: Set(user_id.to_string()),
            post_id: Set(post_id.to_string()),
            created_at: Set(Utc::now().into()),
        }
    }

    #[tokio::test]
    async fn test_insert_edge_created() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let created = repo
            .insert_edge(active_edge("l1", "user1", "post1"))
            .await
            .unwrap();

        assert!(created);
    }

    #[tokio::test]
    async fn test_insert_edge_duplicate_is_noop() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let created = repo
            .insert_edge(active_edge("l2", "user1", "post1"))
            .await
            .unwrap();

        assert!(!created);
    }

    #[tokio::test]
    async fn test_has_liked_true() {
        let edge = create_test_like("l1", "user1", "post1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(repo.has_liked("user1", "post1").await.unwrap());
    }

    #[tokio::test]
    async fn test_has_liked_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<like::Model>::new()])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(!repo.has_liked("user1", "post2").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_edge_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let removed = repo.delete_edge("user1", "post1").await.unwrap();

        assert!(!removed);
    }

    #[tokio::test]
    async fn test_find_by_post() {
        let l1 = create_test_like("l1", "user1", "post1");
        let l2 = create_test_like("l2", "user2", "post1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[l1, l2]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let result = repo.find_by_post("post1", 10, 0).await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
