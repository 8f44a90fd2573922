//! Following service.

use std::collections::HashMap;

use crate::services::notification::{NotificationEvent, NotificationService};
use crate::services::privacy::{RelationStatus, can_view_posts};
use crate::views::UserSummary;
use chrono::{DateTime, FixedOffset};
use inkwell_common::{AppError, AppResult, IdGenerator};
use inkwell_db::{
    entities::{
        follow_edge::{self, FollowStatus},
        user,
    },
    repositories::{FollowEdgeRepository, FollowListQuery, UserRepository},
};
use sea_orm::Set;
use serde::Serialize;

/// A follow request with the account on the other end of it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequestView {
    pub id: String,
    pub user: UserSummary,
    pub requested_at: DateTime<FixedOffset>,
}

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    follow_repo: FollowEdgeRepository,
    user_repo: UserRepository,
    notification_service: Option<NotificationService>,
    id_gen: IdGenerator,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub const fn new(follow_repo: FollowEdgeRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_repo,
            user_repo,
            notification_service: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the notification service.
    pub fn set_notification_service(&mut self, notification_service: NotificationService) {
        self.notification_service = Some(notification_service);
    }

    /// Follow a user.
    ///
    /// A private target gets a pending request; a public target is followed
    /// immediately.
    pub async fn request_follow(
        &self,
        follower_id: &str,
        target_id: &str,
    ) -> AppResult<follow_edge::Model> {
        if follower_id == target_id {
            return Err(AppError::SelfFollow);
        }

        if self
            .follow_repo
            .find_by_pair(follower_id, target_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Already following or requested".to_string(),
            ));
        }

        let target = self.user_repo.get_by_id(target_id).await?;

        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let (status, responded_at) = if target.is_private {
            (FollowStatus::Pending, None)
        } else {
            (FollowStatus::Accepted, Some(now))
        };

        let model = follow_edge::ActiveModel {
            id: Set(self.id_gen.generate()),
            follower_id: Set(follower_id.to_string()),
            followee_id: Set(target_id.to_string()),
            status: Set(status),
            requested_at: Set(now),
            responded_at: Set(responded_at),
        };
        let edge = match self.follow_repo.create(model).await {
            Ok(edge) => edge,
            Err(e) => {
                // A concurrent request for the same pair won the unique index
                if self
                    .follow_repo
                    .find_by_pair(follower_id, target_id)
                    .await?
                    .is_some()
                {
                    return Err(AppError::Conflict(
                        "Already following or requested".to_string(),
                    ));
                }
                return Err(e);
            }
        };

        tracing::info!(
            follower_id = %follower_id,
            followee_id = %target_id,
            status = ?edge.status,
            "Created follow edge"
        );

        match edge.status {
            FollowStatus::Pending => {
                self.notify(
                    target_id,
                    follower_id,
                    NotificationEvent::FollowRequested {
                        follow_id: edge.id.clone(),
                    },
                )
                .await;
            }
            FollowStatus::Accepted => {
                self.refresh_counts(follower_id, target_id).await?;
                self.notify(
                    follower_id,
                    target_id,
                    NotificationEvent::FollowAccepted {
                        follow_id: edge.id.clone(),
                    },
                )
                .await;
            }
            FollowStatus::Rejected => {}
        }

        Ok(edge)
    }

    /// Unfollow a user, or withdraw a pending request.
    pub async fn unfollow(&self, follower_id: &str, target_id: &str) -> AppResult<()> {
        let edge = self
            .follow_repo
            .find_by_pair(follower_id, target_id)
            .await?
            .ok_or(AppError::NotFollowing)?;

        self.follow_repo.delete(edge).await?;
        self.refresh_counts(follower_id, target_id).await?;

        tracing::info!(follower_id = %follower_id, followee_id = %target_id, "Removed follow edge");
        Ok(())
    }

    /// Accept a pending follow request addressed to `acting_id`.
    pub async fn accept_request(
        &self,
        request_id: &str,
        acting_id: &str,
    ) -> AppResult<follow_edge::Model> {
        let edge = self.get_pending_for(request_id, acting_id).await?;
        let follower_id = edge.follower_id.clone();

        let mut active: follow_edge::ActiveModel = edge.into();
        active.status = Set(FollowStatus::Accepted);
        active.responded_at = Set(Some(chrono::Utc::now().into()));
        let edge = self.follow_repo.update(active).await?;

        self.refresh_counts(&follower_id, acting_id).await?;
        self.notify(
            &follower_id,
            acting_id,
            NotificationEvent::FollowAccepted {
                follow_id: edge.id.clone(),
            },
        )
        .await;

        tracing::info!(request_id = %request_id, "Accepted follow request");
        Ok(edge)
    }

    /// Reject a pending follow request addressed to `acting_id`.
    ///
    /// The edge is deleted, so the requester may ask again later.
    pub async fn reject_request(&self, request_id: &str, acting_id: &str) -> AppResult<()> {
        let edge = self.get_pending_for(request_id, acting_id).await?;
        self.follow_repo.delete(edge).await?;

        tracing::info!(request_id = %request_id, "Rejected follow request");
        Ok(())
    }

    /// Resolve how `viewer_id` relates to `target_id`.
    pub async fn status(&self, viewer_id: &str, target_id: &str) -> AppResult<RelationStatus> {
        if viewer_id == target_id {
            return Ok(RelationStatus::Myself);
        }

        let edge = self.follow_repo.find_by_pair(viewer_id, target_id).await?;
        Ok(RelationStatus::from_edge(edge.as_ref()))
    }

    /// Resolve the status of a possibly anonymous viewer.
    pub async fn status_for_viewer(
        &self,
        viewer_id: Option<&str>,
        target_id: &str,
    ) -> AppResult<RelationStatus> {
        match viewer_id {
            Some(viewer_id) => self.status(viewer_id, target_id).await,
            None => Ok(RelationStatus::NotFollowing),
        }
    }

    /// Whether `viewer_id` may see the owner's posts.
    ///
    /// Skips the edge lookup when the answer does not depend on it.
    pub async fn can_view(&self, viewer_id: Option<&str>, owner: &user::Model) -> AppResult<bool> {
        let status = if viewer_id == Some(owner.id.as_str()) {
            RelationStatus::Myself
        } else if owner.is_private {
            self.status_for_viewer(viewer_id, &owner.id).await?
        } else {
            RelationStatus::NotFollowing
        };

        Ok(can_view_posts(viewer_id, &owner.id, owner.is_private, status))
    }

    /// Fail with `Forbidden` unless `viewer_id` may see the owner's posts.
    pub async fn ensure_can_view(
        &self,
        viewer_id: Option<&str>,
        owner: &user::Model,
    ) -> AppResult<()> {
        if self.can_view(viewer_id, owner).await? {
            Ok(())
        } else {
            Err(AppError::Forbidden("This account is private".to_string()))
        }
    }

    /// Accounts following `user_id` (accepted edges only).
    pub async fn followers(
        &self,
        viewer_id: Option<&str>,
        user_id: &str,
        query: &FollowListQuery,
    ) -> AppResult<Vec<UserSummary>> {
        let owner = self.user_repo.get_by_id(user_id).await?;
        self.ensure_can_view(viewer_id, &owner).await?;

        let edges = self.follow_repo.find_followers(user_id, query).await?;
        let ids: Vec<String> = edges.into_iter().map(|e| e.follower_id).collect();
        self.summaries_in_order(&ids).await
    }

    /// Accounts `user_id` follows (accepted edges only).
    pub async fn following(
        &self,
        viewer_id: Option<&str>,
        user_id: &str,
        query: &FollowListQuery,
    ) -> AppResult<Vec<UserSummary>> {
        let owner = self.user_repo.get_by_id(user_id).await?;
        self.ensure_can_view(viewer_id, &owner).await?;

        let edges = self.follow_repo.find_following(user_id, query).await?;
        let ids: Vec<String> = edges.into_iter().map(|e| e.followee_id).collect();
        self.summaries_in_order(&ids).await
    }

    /// Pending requests addressed to `user_id`, with the requesters.
    pub async fn pending_requests(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<FollowRequestView>> {
        let edges = self
            .follow_repo
            .find_pending_received(user_id, limit, until_id)
            .await?;
        self.request_views(edges, |e| &e.follower_id).await
    }

    /// Pending requests sent by `user_id`, with the targets.
    pub async fn sent_requests(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<FollowRequestView>> {
        let edges = self
            .follow_repo
            .find_pending_sent(user_id, limit, until_id)
            .await?;
        self.request_views(edges, |e| &e.followee_id).await
    }

    /// Load the edge and check it is a pending request to `acting_id`.
    ///
    /// Authorization is checked before state so a stranger learns nothing.
    async fn get_pending_for(
        &self,
        request_id: &str,
        acting_id: &str,
    ) -> AppResult<follow_edge::Model> {
        let edge = self
            .follow_repo
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Follow request {request_id}")))?;

        if edge.followee_id != acting_id {
            return Err(AppError::Forbidden(
                "Only the requested account can respond".to_string(),
            ));
        }

        if edge.status != FollowStatus::Pending {
            return Err(AppError::BadRequest(
                "Follow request is no longer pending".to_string(),
            ));
        }

        Ok(edge)
    }

    /// Recompute both cached counters from the accepted edges.
    async fn refresh_counts(&self, follower_id: &str, followee_id: &str) -> AppResult<()> {
        let following = self.follow_repo.count_following(follower_id).await?;
        let followers = self.follow_repo.count_followers(followee_id).await?;

        self.user_repo
            .set_following_count(follower_id, following)
            .await?;
        self.user_repo
            .set_followers_count(followee_id, followers)
            .await?;
        Ok(())
    }

    async fn notify(&self, recipient_id: &str, sender_id: &str, event: NotificationEvent) {
        if let Some(ref notification_service) = self.notification_service
            && let Err(e) = notification_service
                .notify(recipient_id, sender_id, event)
                .await
        {
            tracing::warn!(error = %e, "Failed to create follow notification");
        }
    }

    async fn summaries_in_order(&self, ids: &[String]) -> AppResult<Vec<UserSummary>> {
        let users: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(ids
            .iter()
            .filter_map(|id| users.get(id).map(UserSummary::from))
            .collect())
    }

    async fn request_views(
        &self,
        edges: Vec<follow_edge::Model>,
        other: impl Fn(&follow_edge::Model) -> &String,
    ) -> AppResult<Vec<FollowRequestView>> {
        let ids: Vec<String> = edges.iter().map(|e| other(e).clone()).collect();
        let users: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(edges
            .iter()
            .filter_map(|e| {
                users.get(other(e)).map(|u| FollowRequestView {
                    id: e.id.clone(),
                    user: UserSummary::from(u),
                    requested_at: e.requested_at,
                })
            })
            .collect())
    }
}
