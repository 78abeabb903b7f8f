//! Business logic services.

#![allow(missing_docs)]

pub mod engagement;
pub mod feed;
pub mod follow;
pub mod post;

pub use engagement::{CreateCommentInput, EngagementService, UpdateCommentInput};
pub use feed::{EnrichedPost, FeedService};
pub use follow::{FollowCounts, FollowService};
pub use post::{CreatePostInput, PostService};
