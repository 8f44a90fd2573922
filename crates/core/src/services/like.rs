//! Like service.

use crate::services::following::FollowingService;
use crate::services::notification::{NotificationEvent, NotificationService};
use chrono::Utc;
use inkwell_common::{AppResult, IdGenerator};
use inkwell_db::{
    entities::like,
    repositories::{BlogRepository, CommentRepository, LikeRepository, UserRepository},
};
use sea_orm::Set;
use serde::Serialize;

/// Outcome of toggling a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    /// Whether the target is liked after the toggle
    pub liked: bool,
    pub likes_count: u64,
}

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    like_repo: LikeRepository,
    blog_repo: BlogRepository,
    comment_repo: CommentRepository,
    user_repo: UserRepository,
    following_service: FollowingService,
    notification_service: Option<NotificationService>,
    id_gen: IdGenerator,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(
        like_repo: LikeRepository,
        blog_repo: BlogRepository,
        comment_repo: CommentRepository,
        user_repo: UserRepository,
        following_service: FollowingService,
    ) -> Self {
        Self {
            like_repo,
            blog_repo,
            comment_repo,
            user_repo,
            following_service,
            notification_service: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the notification service.
    pub fn set_notification_service(&mut self, notification_service: NotificationService) {
        self.notification_service = Some(notification_service);
    }

    /// Like a blog, or take the like back.
    ///
    /// A new like notifies the blog's author unless they liked their own post.
    pub async fn toggle_blog_like(&self, user_id: &str, blog_id: &str) -> AppResult<LikeToggle> {
        let blog = self.blog_repo.get_by_id(blog_id).await?;
        let owner = self.user_repo.get_by_id(&blog.author_id).await?;
        self.following_service
            .ensure_can_view(Some(user_id), &owner)
            .await?;

        // `created` is set only when this call stored the like
        let (liked, created) = match self.like_repo.find_blog_like(user_id, blog_id).await? {
            Some(existing) => {
                self.like_repo.delete(existing).await?;
                (false, None)
            }
            None => {
                let model = like::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(user_id.to_string()),
                    blog_id: Set(Some(blog_id.to_string())),
                    comment_id: Set(None),
                    created_at: Set(Utc::now().into()),
                };
                match self.like_repo.create(model).await {
                    Ok(like) => (true, Some(like)),
                    // A double submit already stored this like
                    Err(e) => match self.like_repo.find_blog_like(user_id, blog_id).await? {
                        Some(_) => (true, None),
                        None => return Err(e),
                    },
                }
            }
        };

        let likes_count = self.like_repo.count_by_blog(blog_id).await?;
        self.blog_repo.set_likes_count(blog_id, likes_count).await?;

        if let Some(ref like) = created
            && blog.author_id != user_id
            && let Some(ref notification_service) = self.notification_service
            && let Err(e) = notification_service
                .notify(
                    &blog.author_id,
                    user_id,
                    NotificationEvent::BlogLiked {
                        blog_id: blog.id.clone(),
                        like_id: like.id.clone(),
                    },
                )
                .await
        {
            tracing::warn!(error = %e, "Failed to create like notification");
        }

        Ok(LikeToggle { liked, likes_count })
    }

    /// Like a comment, or take the like back. Comment likes do not notify.
    pub async fn toggle_comment_like(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> AppResult<LikeToggle> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        let blog = self.blog_repo.get_by_id(&comment.blog_id).await?;
        let owner = self.user_repo.get_by_id(&blog.author_id).await?;
        self.following_service
            .ensure_can_view(Some(user_id), &owner)
            .await?;

        let liked = match self.like_repo.find_comment_like(user_id, comment_id).await? {
            Some(existing) => {
                self.like_repo.delete(existing).await?;
                false
            }
            None => {
                let model = like::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(user_id.to_string()),
                    blog_id: Set(None),
                    comment_id: Set(Some(comment_id.to_string())),
                    created_at: Set(Utc::now().into()),
                };
                if let Err(e) = self.like_repo.create(model).await
                    && self
                        .like_repo
                        .find_comment_like(user_id, comment_id)
                        .await?
                        .is_none()
                {
                    return Err(e);
                }
                true
            }
        };

        let likes_count = self.like_repo.count_by_comment(comment_id).await?;
        self.comment_repo
            .set_likes_count(comment_id, likes_count)
            .await?;

        Ok(LikeToggle { liked, likes_count })
    }
}
