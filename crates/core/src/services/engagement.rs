//! Engagement service: likes and comments.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use tidepool_common::{AppError, AppResult, IdGenerator, Page};
use tidepool_db::entities::{
    comment::{self, CommentState},
    like, post,
};
use tidepool_db::repositories::{CommentRepository, LikeRepository, PostRepository};
use validator::Validate;

/// Input for creating a comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    #[validate(length(min = 1, max = 500))]
    pub content: String,
}

/// Input for editing a comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentInput {
    #[validate(length(min = 1, max = 500))]
    pub content: String,
}

/// Service for per-post engagement records.
///
/// Engagement counts are derived on every read; they are never stored on
/// the post row.
#[derive(Clone)]
pub struct EngagementService {
    like_repo: LikeRepository,
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

impl EngagementService {
    /// Create a new engagement service.
    #[must_use]
    pub const fn new(
        like_repo: LikeRepository,
        comment_repo: CommentRepository,
        post_repo: PostRepository,
    ) -> Self {
        Self {
            like_repo,
            comment_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    // ==================== Likes ====================

    /// Like a post.
    ///
    /// Idempotent: a second like from the same user is a no-op, and
    /// concurrent duplicate requests race safely to a single edge.
    /// Returns whether a new edge was created.
    pub async fn like(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        // The target must be a live post; deleted posts report as absent.
        self.post_repo.get_by_id(post_id).await?;

        let model = like::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            post_id: Set(post_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        self.like_repo.insert_edge(model).await
    }

    /// Unlike a post. Returns whether an edge existed and was removed.
    pub async fn unlike(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        self.like_repo.delete_edge(user_id, post_id).await
    }

    /// Check if a user has liked a post.
    pub async fn has_liked(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        self.like_repo.has_liked(user_id, post_id).await
    }

    /// List the likes on a post, most recent first.
    pub async fn list_likers(
        &self,
        post_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Page<like::Model>> {
        let edges = self.like_repo.find_by_post(post_id, limit, offset).await?;
        Ok(Page::new(edges, limit, offset))
    }

    /// List the posts a user has liked, most recently liked first.
    pub async fn list_liked_posts(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Page<post::Model>> {
        let edges = self.like_repo.find_by_user(user_id, limit, offset).await?;
        let has_more = edges.len() as u64 == limit && !edges.is_empty();

        let ids: Vec<String> = edges.iter().map(|e| e.post_id.clone()).collect();
        let mut by_id: HashMap<String, post::Model> = self
            .post_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        // Keep like-recency order; posts deleted since the like drop out.
        let items: Vec<post::Model> = ids.iter().filter_map(|id| by_id.remove(id)).collect();

        Ok(Page {
            items,
            limit,
            offset,
            has_more,
        })
    }

    /// Count likes on a post.
    pub async fn like_count(&self, post_id: &str) -> AppResult<u64> {
        self.like_repo.count_by_post(post_id).await
    }

    // ==================== Comments ====================

    /// Comment on a post.
    ///
    /// The target post must exist with commenting enabled.
    pub async fn add_comment(
        &self,
        user_id: &str,
        post_id: &str,
        input: CreateCommentInput,
    ) -> AppResult<comment::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let post = self.post_repo.get_by_id(post_id).await?;

        if !post.comments_enabled {
            return Err(AppError::PreconditionFailed(
                "Comments are disabled for this post".to_string(),
            ));
        }

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            post_id: Set(post_id.to_string()),
            content: Set(input.content),
            state: Set(CommentState::Active),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.comment_repo.create(model).await
    }

    /// Edit a comment.
    ///
    /// Returns nothing when the comment is absent, deleted, or not
    /// authored by the requester; the cases are deliberately
    /// indistinguishable so a non-author cannot probe for existence.
    pub async fn edit_comment(
        &self,
        comment_id: &str,
        user_id: &str,
        input: UpdateCommentInput,
    ) -> AppResult<Option<comment::Model>> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.comment_repo
            .update_content(comment_id, user_id, &input.content)
            .await
    }

    /// Logically delete a comment. Same ownership masking as editing.
    pub async fn remove_comment(&self, comment_id: &str, user_id: &str) -> AppResult<bool> {
        self.comment_repo.mark_deleted(comment_id, user_id).await
    }

    /// List the active comments on a post in chronological reading order.
    pub async fn list_comments(
        &self,
        post_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Page<comment::Model>> {
        let comments = self.comment_repo.find_by_post(post_id, limit, offset).await?;
        Ok(Page::new(comments, limit, offset))
    }

    /// Count active comments on a post.
    pub async fn comment_count(&self, post_id: &str) -> AppResult<u64> {
        self.comment_repo.count_by_post(post_id).await
    }
}
