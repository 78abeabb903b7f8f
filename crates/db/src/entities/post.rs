//! Post entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Post lifecycle state.
///
/// Deletion is a state transition, never physical row removal, so that
/// like and comment rows referencing the post stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PostState {
    /// Composed but not yet scheduled or published.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Waiting for its `scheduled_at` time.
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    /// Visible in feeds and listings.
    #[sea_orm(string_value = "published")]
    Published,
    /// Logically deleted.
    #[sea_orm(string_value = "deleted")]
    Deleted,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author user ID
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Post text content
    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Attached media URL
    #[sea_orm(nullable)]
    pub media_url: Option<String>,

    /// Whether commenting is allowed
    #[sea_orm(default_value = true)]
    pub comments_enabled: bool,

    /// Lifecycle state
    pub state: PostState,

    /// Target publication time; set iff the post was ever scheduled
    #[sea_orm(nullable, indexed)]
    pub scheduled_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::like::Entity")]
    Like,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Like.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
