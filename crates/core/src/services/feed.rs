//! Feed assembly.
//!
//! The feed is computed at request time (fan-out-on-read): follow edges
//! and post rows are joined per request rather than pre-materialized per
//! follower at write time.

use serde::Serialize;
use tidepool_common::{AppResult, Page};
use tidepool_db::entities::post;
use tidepool_db::repositories::{
    CommentRepository, FollowRepository, LikeRepository, PostRepository,
};

/// A feed entry: a post annotated with live engagement state.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedPost {
    /// The post itself.
    #[serde(flatten)]
    pub post: post::Model,
    /// Live like total.
    pub like_count: u64,
    /// Live active-comment total.
    pub comment_count: u64,
    /// Whether the viewer has liked this post.
    pub is_liked_by_viewer: bool,
}

/// Service composing posts, follows and engagement into a viewer feed.
#[derive(Clone)]
pub struct FeedService {
    post_repo: PostRepository,
    follow_repo: FollowRepository,
    like_repo: LikeRepository,
    comment_repo: CommentRepository,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        follow_repo: FollowRepository,
        like_repo: LikeRepository,
        comment_repo: CommentRepository,
    ) -> Self {
        Self {
            post_repo,
            follow_repo,
            like_repo,
            comment_repo,
        }
    }

    /// Assemble the feed for a viewer.
    ///
    /// The source set is published posts authored by the viewer or by
    /// anyone the viewer follows, newest first (post ID breaks ties).
    /// Engagement state is recomputed for every result at read time; it
    /// is never denormalized onto the post row.
    pub async fn assemble_feed(
        &self,
        viewer_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Page<EnrichedPost>> {
        let mut author_ids = self.follow_repo.following_ids(viewer_id).await?;
        author_ids.push(viewer_id.to_string());

        let posts = self.post_repo.find_feed(&author_ids, limit, offset).await?;

        let mut items = Vec::with_capacity(posts.len());
        for post in posts {
            let like_count = self.like_repo.count_by_post(&post.id).await?;
            let comment_count = self.comment_repo.count_by_post(&post.id).await?;
            let is_liked_by_viewer = self.like_repo.has_liked(viewer_id, &post.id).await?;

            items.push(EnrichedPost {
                post,
                like_count,
                comment_count,
                is_liked_by_viewer,
            });
        }

        Ok(Page::new(items, limit, offset))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::sync::Arc;
    use tidepool_db::entities::{like, post::PostState};

    fn create_test_post(id: &str, user_id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            content: "hello".to_string(),
            media_url: None,
            comments_enabled: true,
            state: PostState::Published,
            scheduled_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn count_row(n: i64) -> Vec<std::collections::BTreeMap<&'static str, Value>> {
        vec![btreemap! { "num_items" => Value::BigInt(Some(n)) }]
    }

    fn service_with(db: MockDatabase) -> FeedService {
        let db = Arc::new(db.into_connection());
        FeedService::new(
            PostRepository::new(Arc::clone(&db)),
            FollowRepository::new(Arc::clone(&db)),
            LikeRepository::new(Arc::clone(&db)),
            CommentRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_feed_enriches_own_fresh_post() {
        let post = create_test_post("p1", "viewer");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // following_ids: nobody followed
            .append_query_results([Vec::<std::collections::BTreeMap<&str, Value>>::new()])
            // feed source set
            .append_query_results([vec![post]])
            // like count
            .append_query_results([count_row(0)])
            // comment count
            .append_query_results([count_row(0)])
            // viewer's own like edge
            .append_query_results([Vec::<like::Model>::new()]);

        let service = service_with(db);
        let page = service.assemble_feed("viewer", 10, 0).await.unwrap();

        assert_eq!(page.items.len(), 1);
        let entry = &page.items[0];
        assert_eq!(entry.post.id, "p1");
        assert_eq!(entry.like_count, 0);
        assert_eq!(entry.comment_count, 0);
        assert!(!entry.is_liked_by_viewer);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_feed_includes_followed_author_posts() {
        let followed_post = create_test_post("q1", "author_b");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                btreemap! { "followee_id" => Value::from("author_b") },
            ]])
            .append_query_results([vec![followed_post]])
            .append_query_results([count_row(2)])
            .append_query_results([count_row(1)])
            .append_query_results([vec![like::Model {
                id: "l1".to_string(),
                user_id: "viewer".to_string(),
                post_id: "q1".to_string(),
                created_at: Utc::now().into(),
            }]]);

        let service = service_with(db);
        let page = service.assemble_feed("viewer", 10, 0).await.unwrap();

        assert_eq!(page.items.len(), 1);
        let entry = &page.items[0];
        assert_eq!(entry.post.user_id, "author_b");
        assert_eq!(entry.like_count, 2);
        assert_eq!(entry.comment_count, 1);
        assert!(entry.is_liked_by_viewer);
    }

    #[tokio::test]
    async fn test_feed_full_page_reports_has_more() {
        let p1 = create_test_post("p2", "viewer");
        let p2 = create_test_post("p1", "viewer");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<std::collections::BTreeMap<&str, Value>>::new()])
            .append_query_results([vec![p1, p2]])
            .append_query_results([count_row(0)])
            .append_query_results([count_row(0)])
            .append_query_results([Vec::<like::Model>::new()])
            .append_query_results([count_row(0)])
            .append_query_results([count_row(0)])
            .append_query_results([Vec::<like::Model>::new()]);

        let service = service_with(db);
        let page = service.assemble_feed("viewer", 2, 0).await.unwrap();

        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);
    }

    #[test]
    fn test_enriched_post_serializes_flat() {
        let entry = EnrichedPost {
            post: create_test_post("p1", "viewer"),
            like_count: 3,
            comment_count: 1,
            is_liked_by_viewer: true,
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["id"], "p1");
        assert_eq!(value["like_count"], 3);
        assert_eq!(value["is_liked_by_viewer"], true);
    }
}
