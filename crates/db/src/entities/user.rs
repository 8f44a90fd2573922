//! User (account) entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Handle, unique case-insensitively through `username_lower`
    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub username_lower: String,

    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(unique)]
    pub phone: String,

    /// Display name
    pub name: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Bearer credential (issued on activation and sign-in)
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Inactive until the activation link is followed
    #[sea_orm(default_value = false)]
    pub is_active: bool,

    /// Private accounts require follow approval
    #[sea_orm(default_value = false)]
    pub is_private: bool,

    /// Single-use activation token
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub activation_token: Option<String>,

    #[sea_orm(nullable)]
    pub activation_expires_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    /// Opaque deletion handle returned by object storage
    #[sea_orm(nullable)]
    pub avatar_handle: Option<String>,

    /// Posts count (cached, recomputed from the blog table)
    #[sea_orm(default_value = 0)]
    pub posts_count: i32,

    /// Followers count (cached, recomputed from accepted edges)
    #[sea_orm(default_value = 0)]
    pub followers_count: i32,

    /// Following count (cached, recomputed from accepted edges)
    #[sea_orm(default_value = 0)]
    pub following_count: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::blog::Entity")]
    Blogs,
}

impl Related<super::blog::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Blogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Name shown in notification messages and summaries.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.username
        } else {
            &self.name
        }
    }
}
