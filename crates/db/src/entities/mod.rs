//! Database entities.

#![allow(missing_docs)]

pub mod comment;
pub mod follow;
pub mod like;
pub mod post;

pub use comment::Entity as Comment;
pub use follow::Entity as Follow;
pub use like::Entity as Like;
pub use post::Entity as Post;
