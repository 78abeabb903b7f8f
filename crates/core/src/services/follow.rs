//! Follow service.

use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;
use tidepool_common::{AppError, AppResult, IdGenerator, Page};
use tidepool_db::entities::follow;
use tidepool_db::repositories::FollowRepository;

/// Following and follower totals for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FollowCounts {
    pub following_count: u64,
    pub followers_count: u64,
}

/// Service for the directed follow graph.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    id_gen: IdGenerator,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository) -> Self {
        Self {
            follow_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Follow a user.
    ///
    /// Idempotent: following someone already followed is a no-op, and
    /// concurrent duplicate requests race safely to a single edge.
    /// Returns whether a new edge was created.
    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        if follower_id == followee_id {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }

        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            follower_id: Set(follower_id.to_string()),
            followee_id: Set(followee_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let created = self.follow_repo.insert_edge(model).await?;

        if created {
            tracing::debug!(follower_id, followee_id, "Follow edge created");
        }

        Ok(created)
    }

    /// Unfollow a user. Returns whether an edge existed and was removed.
    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        self.follow_repo.delete_edge(follower_id, followee_id).await
    }

    /// Check if a user is following another.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        self.follow_repo.is_following(follower_id, followee_id).await
    }

    /// List the users a user is following, most recent edge first.
    pub async fn list_following(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Page<follow::Model>> {
        let edges = self.follow_repo.find_following(user_id, limit, offset).await?;
        Ok(Page::new(edges, limit, offset))
    }

    /// List the users following a user, most recent edge first.
    pub async fn list_followers(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Page<follow::Model>> {
        let edges = self.follow_repo.find_followers(user_id, limit, offset).await?;
        Ok(Page::new(edges, limit, offset))
    }

    /// Get following/follower totals for a user.
    pub async fn counts(&self, user_id: &str) -> AppResult<FollowCounts> {
        let following_count = self.follow_repo.count_following(user_id).await?;
        let followers_count = self.follow_repo.count_followers(user_id).await?;

        Ok(FollowCounts {
            following_count,
            followers_count,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::sync::Arc;

    fn service_with(db: MockDatabase) -> FollowService {
        let db = Arc::new(db.into_connection());
        FollowService::new(FollowRepository::new(db))
    }

    #[tokio::test]
    async fn test_follow_yourself_returns_error() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.follow("user1", "user1").await;

        match result {
            Err(AppError::BadRequest(msg)) => {
                assert!(msg.contains("Cannot follow yourself"));
            }
            other => panic!("Expected BadRequest error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_follow_creates_edge() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results(
            [MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }],
        ));

        let created = service.follow("user1", "user2").await.unwrap();
        assert!(created);
    }

    #[tokio::test]
    async fn test_follow_twice_second_is_noop() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results(
            [
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ],
        ));

        assert!(service.follow("user1", "user2").await.unwrap());
        assert!(!service.follow("user1", "user2").await.unwrap());
    }

    #[tokio::test]
    async fn test_unfollow_without_edge_returns_false() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results(
            [MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }],
        ));

        let removed = service.unfollow("user1", "user2").await.unwrap();
        assert!(!removed);
    }

    #[tokio::test]
    async fn test_counts() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    vec![btreemap! { "num_items" => Value::BigInt(Some(1)) }],
                    vec![btreemap! { "num_items" => Value::BigInt(Some(3)) }],
                ]),
        );

        let counts = service.counts("user1").await.unwrap();
        assert_eq!(
            counts,
            FollowCounts {
                following_count: 1,
                followers_count: 3,
            }
        );
    }
}
