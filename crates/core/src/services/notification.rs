//! Notification service.

use std::collections::HashMap;

use crate::services::dispatcher::{DispatchMessage, DispatcherService};
use crate::views::{BlogSummary, NotificationView, UserSummary};
use inkwell_common::{AppError, AppResult, IdGenerator};
use inkwell_db::{
    entities::notification::{self, NotificationType},
    repositories::{BlogRepository, NotificationQuery, NotificationRepository, UserRepository},
};
use sea_orm::Set;

/// A domain event that addresses a notification to someone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// A blog received a like.
    BlogLiked { blog_id: String, like_id: String },
    /// A blog received a comment.
    BlogCommented { blog_id: String, comment_id: String },
    /// A private account received a follow request.
    FollowRequested { follow_id: String },
    /// A follow edge became accepted.
    FollowAccepted { follow_id: String },
}

impl NotificationEvent {
    const fn notification_type(&self) -> NotificationType {
        match self {
            Self::BlogLiked { .. } => NotificationType::Like,
            Self::BlogCommented { .. } => NotificationType::Comment,
            Self::FollowRequested { .. } => NotificationType::FollowRequest,
            Self::FollowAccepted { .. } => NotificationType::FollowAccepted,
        }
    }

    /// Unique per triggering event; a replay maps to the same key.
    fn event_key(&self) -> String {
        match self {
            Self::BlogLiked { like_id, .. } => format!("blog_like:{like_id}"),
            Self::BlogCommented { comment_id, .. } => format!("blog_comment:{comment_id}"),
            Self::FollowRequested { follow_id } => format!("follow_request:{follow_id}"),
            Self::FollowAccepted { follow_id } => format!("follow_accepted:{follow_id}"),
        }
    }

    /// Shared by notifications that clients may collapse together.
    fn group_key(&self) -> Option<String> {
        match self {
            Self::BlogLiked { blog_id, .. } => Some(format!("blog_like:{blog_id}")),
            Self::BlogCommented { blog_id, .. } => Some(format!("blog_comment:{blog_id}")),
            Self::FollowRequested { .. } | Self::FollowAccepted { .. } => None,
        }
    }

    fn blog_id(&self) -> Option<&str> {
        match self {
            Self::BlogLiked { blog_id, .. } | Self::BlogCommented { blog_id, .. } => Some(blog_id),
            Self::FollowRequested { .. } | Self::FollowAccepted { .. } => None,
        }
    }

    fn comment_id(&self) -> Option<&str> {
        match self {
            Self::BlogCommented { comment_id, .. } => Some(comment_id),
            _ => None,
        }
    }

    fn follow_id(&self) -> Option<&str> {
        match self {
            Self::FollowRequested { follow_id } | Self::FollowAccepted { follow_id } => {
                Some(follow_id)
            }
            _ => None,
        }
    }

    /// Title and message shown to the recipient.
    fn render(&self, sender_name: &str, blog_title: &str) -> (String, String) {
        match self {
            Self::BlogLiked { .. } => (
                "New like".to_string(),
                format!("{sender_name} liked your blog \"{blog_title}\""),
            ),
            Self::BlogCommented { .. } => (
                "New comment".to_string(),
                format!("{sender_name} commented on your blog \"{blog_title}\""),
            ),
            Self::FollowRequested { .. } => (
                "New follow request".to_string(),
                format!("{sender_name} wants to follow you"),
            ),
            Self::FollowAccepted { .. } => (
                "Follow request accepted".to_string(),
                format!("{sender_name} accepted your follow request"),
            ),
        }
    }
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    user_repo: UserRepository,
    blog_repo: BlogRepository,
    dispatcher: Option<DispatcherService>,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(
        notification_repo: NotificationRepository,
        user_repo: UserRepository,
        blog_repo: BlogRepository,
    ) -> Self {
        Self {
            notification_repo,
            user_repo,
            blog_repo,
            dispatcher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the real-time dispatcher.
    pub fn set_dispatcher(&mut self, dispatcher: DispatcherService) {
        self.dispatcher = Some(dispatcher);
    }

    /// Persist a notification for `event` and push it to the recipient's room.
    ///
    /// Emitting the same event twice returns the stored record without
    /// inserting or pushing again.
    pub async fn notify(
        &self,
        recipient_id: &str,
        sender_id: &str,
        event: NotificationEvent,
    ) -> AppResult<NotificationView> {
        if recipient_id == sender_id {
            tracing::error!(
                user_id = %recipient_id,
                event = ?event,
                "Refusing to create self-notification"
            );
            return Err(AppError::SelfNotification(recipient_id.to_string()));
        }

        let event_key = event.event_key();
        if let Some(existing) = self.notification_repo.find_by_event_key(&event_key).await? {
            tracing::debug!(event_key = %event_key, "Notification already emitted");
            return self.populate_one(existing).await;
        }

        let sender = self.user_repo.get_by_id(sender_id).await?;
        let blog = match event.blog_id() {
            Some(blog_id) => Some(self.blog_repo.get_by_id(blog_id).await?),
            None => None,
        };

        let (title, message) = event.render(
            sender.display_name(),
            blog.as_ref().map_or("", |b| b.title.as_str()),
        );

        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            recipient_id: Set(recipient_id.to_string()),
            sender_id: Set(sender_id.to_string()),
            notification_type: Set(event.notification_type()),
            title: Set(title),
            message: Set(message),
            blog_id: Set(event.blog_id().map(str::to_string)),
            comment_id: Set(event.comment_id().map(str::to_string)),
            follow_id: Set(event.follow_id().map(str::to_string)),
            is_read: Set(false),
            read_at: Set(None),
            group_key: Set(event.group_key()),
            event_key: Set(event_key.clone()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let created = match self.notification_repo.create(model).await {
            Ok(created) => created,
            Err(e) => {
                // A concurrent emission of the same event won the unique key
                if let Some(existing) = self.notification_repo.find_by_event_key(&event_key).await? {
                    return self.populate_one(existing).await;
                }
                return Err(e);
            }
        };

        let view = NotificationView::new(
            created,
            Some(UserSummary::from(&sender)),
            blog.as_ref().map(BlogSummary::from),
        );

        tracing::info!(
            notification_id = %view.id,
            recipient_id = %recipient_id,
            notification_type = %view.notification_type.as_str(),
            "Created notification"
        );

        if let Some(ref dispatcher) = self.dispatcher {
            dispatcher
                .broadcast(recipient_id, DispatchMessage::NewNotification(view.clone()))
                .await;
        }
        self.push_unread_count(recipient_id).await;

        Ok(view)
    }

    /// Get notifications for a recipient, populated with sender and blog summaries.
    pub async fn list(
        &self,
        recipient_id: &str,
        query: &NotificationQuery,
    ) -> AppResult<Vec<NotificationView>> {
        let models = self
            .notification_repo
            .find_by_recipient(recipient_id, query)
            .await?;
        self.populate(models).await
    }

    /// Count unread notifications.
    pub async fn unread_count(&self, recipient_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(recipient_id).await
    }

    /// Mark one notification as read.
    pub async fn mark_as_read(
        &self,
        recipient_id: &str,
        notification_id: &str,
    ) -> AppResult<notification::Model> {
        let notification = self.get_owned(recipient_id, notification_id).await?;
        let was_unread = !notification.is_read;
        let updated = self.notification_repo.mark_as_read(notification).await?;

        if was_unread {
            self.push_unread_count(recipient_id).await;
        }

        Ok(updated)
    }

    /// Mark every notification of the recipient as read.
    pub async fn mark_all_as_read(&self, recipient_id: &str) -> AppResult<u64> {
        let updated = self.notification_repo.mark_all_as_read(recipient_id).await?;

        if updated > 0 {
            self.push_unread_count(recipient_id).await;
        }

        Ok(updated)
    }

    /// Delete one notification.
    pub async fn delete(&self, recipient_id: &str, notification_id: &str) -> AppResult<()> {
        let notification = self.get_owned(recipient_id, notification_id).await?;
        let was_unread = !notification.is_read;
        self.notification_repo.delete(notification).await?;

        if was_unread {
            self.push_unread_count(recipient_id).await;
        }

        Ok(())
    }

    /// Another account's notification is indistinguishable from a missing one.
    async fn get_owned(
        &self,
        recipient_id: &str,
        notification_id: &str,
    ) -> AppResult<notification::Model> {
        self.notification_repo
            .find_by_id(notification_id)
            .await?
            .filter(|n| n.recipient_id == recipient_id)
            .ok_or_else(|| AppError::NotFound(format!("Notification {notification_id}")))
    }

    async fn push_unread_count(&self, recipient_id: &str) {
        let Some(ref dispatcher) = self.dispatcher else {
            return;
        };

        match self.notification_repo.count_unread(recipient_id).await {
            Ok(count) => {
                dispatcher
                    .broadcast(
                        recipient_id,
                        DispatchMessage::NotificationCountUpdate { count },
                    )
                    .await;
            }
            Err(e) => {
                tracing::warn!(error = %e, recipient_id = %recipient_id, "Failed to count unread notifications");
            }
        }
    }

    async fn populate_one(&self, model: notification::Model) -> AppResult<NotificationView> {
        let mut views = self.populate(vec![model]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Internal("Notification vanished while populating".to_string()))
    }

    async fn populate(&self, models: Vec<notification::Model>) -> AppResult<Vec<NotificationView>> {
        if models.is_empty() {
            return Ok(vec![]);
        }

        let mut sender_ids: Vec<String> = models.iter().map(|n| n.sender_id.clone()).collect();
        sender_ids.sort();
        sender_ids.dedup();

        let mut blog_ids: Vec<String> = models.iter().filter_map(|n| n.blog_id.clone()).collect();
        blog_ids.sort();
        blog_ids.dedup();

        let senders: HashMap<String, UserSummary> = self
            .user_repo
            .find_by_ids(&sender_ids)
            .await?
            .iter()
            .map(|u| (u.id.clone(), UserSummary::from(u)))
            .collect();

        let blogs: HashMap<String, BlogSummary> = self
            .blog_repo
            .find_by_ids(&blog_ids)
            .await?
            .iter()
            .map(|b| (b.id.clone(), BlogSummary::from(b)))
            .collect();

        Ok(models
            .into_iter()
            .map(|n| {
                let sender = senders.get(&n.sender_id).cloned();
                let blog = n.blog_id.as_ref().and_then(|id| blogs.get(id).cloned());
                NotificationView::new(n, sender, blog)
            })
            .collect())
    }
}
