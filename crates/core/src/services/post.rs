//! Post service.

use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::Deserialize;
use tidepool_common::{AppError, AppResult, IdGenerator, Page};
use tidepool_db::entities::post::{self, PostState};
use tidepool_db::repositories::PostRepository;
use validator::Validate;

/// Input for creating a post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[validate(url)]
    pub media_url: Option<String>,
    #[serde(default = "default_comments_enabled")]
    pub comments_enabled: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
}

const fn default_comments_enabled() -> bool {
    true
}

/// Service for managing the post lifecycle.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(post_repo: PostRepository) -> Self {
        Self {
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post.
    ///
    /// A future `scheduled_at` puts the post in the `scheduled` state;
    /// without one it is published immediately. The schedule ordering is
    /// re-checked here even though the transport validates it upstream.
    pub async fn create(&self, author_id: &str, input: CreatePostInput) -> AppResult<post::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let now = Utc::now();
        let state = match input.scheduled_at {
            Some(at) if at <= now => {
                return Err(AppError::BadRequest(
                    "Scheduled time must be in the future".to_string(),
                ));
            }
            Some(_) => PostState::Scheduled,
            None => PostState::Published,
        };

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(author_id.to_string()),
            content: Set(input.content),
            media_url: Set(input.media_url),
            comments_enabled: Set(input.comments_enabled),
            state: Set(state),
            scheduled_at: Set(input.scheduled_at.map(Into::into)),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        self.post_repo.create(model).await
    }

    /// Get a post by ID. Deleted posts are reported as absent.
    pub async fn get_by_id(&self, post_id: &str) -> AppResult<Option<post::Model>> {
        self.post_repo.find_by_id(post_id).await
    }

    /// List an author's published posts, newest first.
    pub async fn list_by_author(
        &self,
        author_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Page<post::Model>> {
        let posts = self
            .post_repo
            .find_published_by_author(author_id, limit, offset)
            .await?;

        Ok(Page::new(posts, limit, offset))
    }

    /// List an author's scheduled posts, soonest first.
    pub async fn list_scheduled_by_author(
        &self,
        author_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Page<post::Model>> {
        let posts = self
            .post_repo
            .find_scheduled_by_author(author_id, limit, offset)
            .await?;

        Ok(Page::new(posts, limit, offset))
    }

    /// Logically delete a post.
    ///
    /// Returns false when the post is absent or not owned by the
    /// requester; the two cases are deliberately indistinguishable so a
    /// non-owner cannot probe for existence.
    pub async fn delete(&self, post_id: &str, requester_id: &str) -> AppResult<bool> {
        let deleted = self.post_repo.mark_deleted(post_id, requester_id).await?;

        if deleted {
            tracing::info!(post_id, requester_id, "Post deleted");
        }

        Ok(deleted)
    }

    /// Promote every due scheduled post to published, returning the
    /// promoted set.
    pub async fn promote_due_posts(&self) -> AppResult<Vec<post::Model>> {
        self.post_repo.promote_due().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_post(id: &str, user_id: &str, state: PostState) -> post::Model {
        post::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            content: "hello".to_string(),
            media_url: None,
            comments_enabled: true,
            state,
            scheduled_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service_with(db: MockDatabase) -> PostService {
        let db = Arc::new(db.into_connection());
        PostService::new(PostRepository::new(db))
    }

    #[tokio::test]
    async fn test_create_published_immediately() {
        let expected = create_test_post("p1", "user1", PostState::Published);
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[expected.clone()]]),
        );

        let input = CreatePostInput {
            content: "hello".to_string(),
            media_url: None,
            comments_enabled: true,
            scheduled_at: None,
        };

        let post = service.create("user1", input).await.unwrap();
        assert_eq!(post.state, PostState::Published);
    }

    #[tokio::test]
    async fn test_create_with_past_schedule_is_rejected() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));

        let input = CreatePostInput {
            content: "hello".to_string(),
            media_url: None,
            comments_enabled: true,
            scheduled_at: Some(Utc::now() - Duration::minutes(5)),
        };

        let result = service.create("user1", input).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_with_empty_content_is_rejected() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));

        let input = CreatePostInput {
            content: String::new(),
            media_url: None,
            comments_enabled: true,
            scheduled_at: None,
        };

        let result = service.create("user1", input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_by_id_found() {
        let expected = create_test_post("p1", "user1", PostState::Published);
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[expected]]),
        );

        let result = service.get_by_id("p1").await.unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_delete_not_owned_returns_false() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results(
            [MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }],
        ));

        let deleted = service.delete("p1", "intruder").await.unwrap();
        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_list_by_author_full_page_has_more() {
        let p1 = create_test_post("p2", "user1", PostState::Published);
        let p2 = create_test_post("p1", "user1", PostState::Published);
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[p1, p2]]),
        );

        let page = service.list_by_author("user1", 2, 0).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn test_list_by_author_short_page_has_no_more() {
        let p1 = create_test_post("p1", "user1", PostState::Published);
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[p1]]),
        );

        let page = service.list_by_author("user1", 2, 4).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(!page.has_more);
    }
}
