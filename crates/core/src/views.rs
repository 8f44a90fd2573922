//! Serializable read models shared by services and the HTTP layer.

use chrono::{DateTime, FixedOffset};
use inkwell_db::entities::{
    blog, notification,
    notification::NotificationType,
    user,
};
use serde::Serialize;

/// Public account card used in lists, notifications and mutual followers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub is_private: bool,
}

impl From<&user::Model> for UserSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            name: user.display_name().to_string(),
            avatar_url: user.avatar_url.clone(),
            is_private: user.is_private,
        }
    }
}

/// Minimal blog reference embedded in notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlogSummary {
    pub id: String,
    pub title: String,
}

impl From<&blog::Model> for BlogSummary {
    fn from(blog: &blog::Model) -> Self {
        Self {
            id: blog.id.clone(),
            title: blog.title.clone(),
        }
    }
}

/// A notification populated with its sender and blog summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub sender: Option<UserSummary>,
    pub blog: Option<BlogSummary>,
    pub comment_id: Option<String>,
    pub follow_id: Option<String>,
    pub group_key: Option<String>,
}

impl NotificationView {
    /// Build a view from a stored record and whatever summaries were resolved.
    #[must_use]
    pub fn new(
        model: notification::Model,
        sender: Option<UserSummary>,
        blog: Option<BlogSummary>,
    ) -> Self {
        Self {
            id: model.id,
            notification_type: model.notification_type,
            title: model.title,
            message: model.message,
            is_read: model.is_read,
            read_at: model.read_at,
            created_at: model.created_at,
            sender,
            blog,
            comment_id: model.comment_id,
            follow_id: model.follow_id,
            group_key: model.group_key,
        }
    }
}
