//! Database repositories.

#![allow(missing_docs)]

pub mod comment;
pub mod follow;
pub mod like;
pub mod post;

pub use comment::CommentRepository;
pub use follow::FollowRepository;
pub use like::LikeRepository;
pub use post::PostRepository;
