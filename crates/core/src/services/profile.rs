//! Profile aggregation.

use std::collections::{HashMap, HashSet};

use crate::services::following::FollowingService;
use crate::services::privacy::{RelationStatus, can_view_posts};
use crate::views::UserSummary;
use chrono::{DateTime, FixedOffset};
use inkwell_common::AppResult;
use inkwell_db::{
    entities::user,
    repositories::{BlogRepository, FollowEdgeRepository, UserRepository},
};
use serde::Serialize;

/// Number of mutual followers shown on a profile.
const MUTUAL_FOLLOWERS_SHOWN: usize = 3;

/// A profile as seen by a particular viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: UserSummary,
    pub bio: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub follow_status: RelationStatus,
    pub followers_count: u64,
    pub following_count: u64,
    pub posts_count: u64,
    pub can_view_posts: bool,
    pub mutual_followers: Vec<UserSummary>,
}

/// Assembles profile views from the account, edge and blog stores.
#[derive(Clone)]
pub struct ProfileService {
    user_repo: UserRepository,
    follow_repo: FollowEdgeRepository,
    blog_repo: BlogRepository,
    following_service: FollowingService,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        follow_repo: FollowEdgeRepository,
        blog_repo: BlogRepository,
        following_service: FollowingService,
    ) -> Self {
        Self {
            user_repo,
            follow_repo,
            blog_repo,
            following_service,
        }
    }

    /// Profile of `target_id` as seen by `viewer_id`.
    pub async fn show(&self, viewer_id: Option<&str>, target_id: &str) -> AppResult<ProfileView> {
        let target = self.user_repo.get_by_id(target_id).await?;
        self.build(viewer_id, target).await
    }

    /// Profile looked up by handle.
    pub async fn show_by_username(
        &self,
        viewer_id: Option<&str>,
        username: &str,
    ) -> AppResult<ProfileView> {
        let target = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| inkwell_common::AppError::UserNotFound(username.to_string()))?;
        self.build(viewer_id, target).await
    }

    async fn build(&self, viewer_id: Option<&str>, target: user::Model) -> AppResult<ProfileView> {
        let follow_status = self
            .following_service
            .status_for_viewer(viewer_id, &target.id)
            .await?;

        // Counts come from the edge store, not the cached columns
        let followers_count = self.follow_repo.count_followers(&target.id).await?;
        let following_count = self.follow_repo.count_following(&target.id).await?;
        let posts_count = self.blog_repo.count_by_author(&target.id).await?;

        let mutual_followers = match viewer_id {
            Some(viewer_id) if viewer_id != target.id => {
                self.mutual_followers(viewer_id, &target.id).await?
            }
            _ => vec![],
        };

        Ok(ProfileView {
            user: UserSummary::from(&target),
            can_view_posts: can_view_posts(
                viewer_id,
                &target.id,
                target.is_private,
                follow_status,
            ),
            bio: target.bio,
            created_at: target.created_at,
            follow_status,
            followers_count,
            following_count,
            posts_count,
            mutual_followers,
        })
    }

    /// Accounts following both the viewer and the target, in the target's
    /// follower order.
    async fn mutual_followers(
        &self,
        viewer_id: &str,
        target_id: &str,
    ) -> AppResult<Vec<UserSummary>> {
        let target_followers = self.follow_repo.find_follower_ids(target_id).await?;
        if target_followers.is_empty() {
            return Ok(vec![]);
        }

        let viewer_followers: HashSet<String> = self
            .follow_repo
            .find_follower_ids(viewer_id)
            .await?
            .into_iter()
            .collect();

        let mutual: Vec<String> = target_followers
            .into_iter()
            .filter(|id| viewer_followers.contains(id))
            .take(MUTUAL_FOLLOWERS_SHOWN)
            .collect();

        let users: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&mutual)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(mutual
            .iter()
            .filter_map(|id| users.get(id).map(UserSummary::from))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use inkwell_db::entities::follow_edge::{self, FollowStatus};
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
    use std::sync::Arc;

    fn create_test_user(id: &str, is_private: bool) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: id.to_string(),
            username_lower: id.to_lowercase(),
            email: format!("{id}@example.com"),
            phone: format!("+1555{id}"),
            name: id.to_string(),
            password_hash: String::new(),
            token: None,
            is_active: true,
            is_private,
            activation_token: None,
            activation_expires_at: None,
            bio: Some("hello".to_string()),
            avatar_url: None,
            avatar_handle: None,
            posts_count: 0,
            followers_count: 99,
            following_count: 99,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn edge(id: &str, follower_id: &str, followee_id: &str, status: FollowStatus) -> follow_edge::Model {
        follow_edge::Model {
            id: id.to_string(),
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            status,
            requested_at: Utc::now().into(),
            responded_at: None,
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, Value> {
        btreemap! { "num_items" => Into::<Value>::into(n) }
    }

    fn service(
        user_db: Arc<DatabaseConnection>,
        follow_db: Arc<DatabaseConnection>,
        blog_db: Arc<DatabaseConnection>,
    ) -> ProfileService {
        let user_repo = UserRepository::new(user_db);
        let follow_repo = FollowEdgeRepository::new(follow_db);
        let following_service = FollowingService::new(follow_repo.clone(), user_repo.clone());
        ProfileService::new(
            user_repo,
            follow_repo,
            BlogRepository::new(blog_db),
            following_service,
        )
    }

    #[tokio::test]
    async fn test_anonymous_view_of_private_profile() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("dave", true)]])
                .into_connection(),
        );
        let follow_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(2)]])
                .append_query_results([[count_row(1)]])
                .into_connection(),
        );
        let blog_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(4)]])
                .into_connection(),
        );

        let profile = service(user_db, follow_db, blog_db)
            .show(None, "dave")
            .await
            .unwrap();

        assert_eq!(profile.follow_status, RelationStatus::NotFollowing);
        assert!(!profile.can_view_posts);
        // Recomputed, not the cached 99
        assert_eq!(profile.followers_count, 2);
        assert_eq!(profile.following_count, 1);
        assert_eq!(profile.posts_count, 4);
        assert!(profile.mutual_followers.is_empty());
    }

    #[tokio::test]
    async fn test_mutual_followers_in_target_order() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("bob", false)]])
                .append_query_results([[
                    create_test_user("erin", false),
                    create_test_user("carol", false),
                ]])
                .into_connection(),
        );
        let follow_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // status(alice, bob)
                .append_query_results([[edge("e0", "alice", "bob", FollowStatus::Accepted)]])
                .append_query_results([[count_row(3)]])
                .append_query_results([[count_row(0)]])
                // bob's followers, newest first
                .append_query_results([[
                    edge("e3", "carol", "bob", FollowStatus::Accepted),
                    edge("e2", "alice", "bob", FollowStatus::Accepted),
                    edge("e1", "erin", "bob", FollowStatus::Accepted),
                ]])
                // alice's followers
                .append_query_results([[
                    edge("e5", "erin", "alice", FollowStatus::Accepted),
                    edge("e4", "carol", "alice", FollowStatus::Accepted),
                ]])
                .into_connection(),
        );
        let blog_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(0)]])
                .into_connection(),
        );

        let profile = service(user_db, follow_db, blog_db)
            .show(Some("alice"), "bob")
            .await
            .unwrap();

        assert_eq!(profile.follow_status, RelationStatus::Following);
        assert!(profile.can_view_posts);
        let mutual: Vec<&str> = profile
            .mutual_followers
            .iter()
            .map(|u| u.id.as_str())
            .collect();
        assert_eq!(mutual, ["carol", "erin"]);
    }
}
