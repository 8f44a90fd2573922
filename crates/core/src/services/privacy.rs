//! Follow-status resolution and the privacy gate.

use inkwell_db::entities::follow_edge::{self, FollowStatus};
use serde::{Deserialize, Serialize};

/// How a viewer relates to another account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationStatus {
    /// Viewer and target are the same account.
    #[serde(rename = "self")]
    Myself,
    /// An accepted edge from viewer to target exists.
    Following,
    /// A pending request from viewer to target exists.
    Pending,
    NotFollowing,
}

impl RelationStatus {
    /// Resolve from the edge (if any) between two distinct accounts.
    #[must_use]
    pub fn from_edge(edge: Option<&follow_edge::Model>) -> Self {
        match edge.map(|e| e.status) {
            Some(FollowStatus::Accepted) => Self::Following,
            Some(FollowStatus::Pending) => Self::Pending,
            Some(FollowStatus::Rejected) | None => Self::NotFollowing,
        }
    }
}

/// Whether `viewer_id` may see the posts of the owner.
///
/// Anonymous viewers pass `None` and `NotFollowing`.
#[must_use]
pub fn can_view_posts(
    viewer_id: Option<&str>,
    owner_id: &str,
    owner_is_private: bool,
    status: RelationStatus,
) -> bool {
    viewer_id == Some(owner_id) || !owner_is_private || status == RelationStatus::Following
}
