//! Follow edge repository.

use std::sync::Arc;

use crate::entities::{FollowEdge, follow_edge, follow_edge::FollowStatus, user};
use inkwell_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    sea_query::{Expr, Func},
};

use super::contains_pattern;

/// Offset pagination and optional search for follower/following lists.
#[derive(Debug, Clone, Default)]
pub struct FollowListQuery {
    pub limit: u64,
    pub offset: u64,
    /// Matched case-insensitively against the other account's handle and display name
    pub search: Option<String>,
}

/// Follow edge repository for database operations.
#[derive(Clone)]
pub struct FollowEdgeRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowEdgeRepository {
    /// Create a new follow edge repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an edge by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<follow_edge::Model>> {
        FollowEdge::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the edge for an ordered pair, whatever its status.
    pub async fn find_by_pair(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<Option<follow_edge::Model>> {
        FollowEdge::find()
            .filter(follow_edge::Column::FollowerId.eq(follower_id))
            .filter(follow_edge::Column::FolloweeId.eq(followee_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new edge. A second edge for the same pair is a `Conflict`.
    pub async fn create(&self, model: follow_edge::ActiveModel) -> AppResult<follow_edge::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| super::insert_error(e, "Follow edge"))
    }

    /// Update an edge.
    pub async fn update(&self, model: follow_edge::ActiveModel) -> AppResult<follow_edge::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an edge.
    pub async fn delete(&self, edge: follow_edge::Model) -> AppResult<()> {
        edge.delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count accepted followers of a user.
    pub async fn count_followers(&self, user_id: &str) -> AppResult<u64> {
        FollowEdge::find()
            .filter(follow_edge::Column::FolloweeId.eq(user_id))
            .filter(follow_edge::Column::Status.eq(FollowStatus::Accepted))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count accounts a user follows (accepted only).
    pub async fn count_following(&self, user_id: &str) -> AppResult<u64> {
        FollowEdge::find()
            .filter(follow_edge::Column::FollowerId.eq(user_id))
            .filter(follow_edge::Column::Status.eq(FollowStatus::Accepted))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Accepted follower edges of a user, newest first.
    pub async fn find_followers(
        &self,
        user_id: &str,
        query: &FollowListQuery,
    ) -> AppResult<Vec<follow_edge::Model>> {
        let mut select = FollowEdge::find()
            .filter(follow_edge::Column::FolloweeId.eq(user_id))
            .filter(follow_edge::Column::Status.eq(FollowStatus::Accepted));

        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            select = select
                .join(JoinType::InnerJoin, follow_edge::Relation::Follower.def())
                .filter(search_condition(search));
        }

        select
            .order_by_desc(follow_edge::Column::Id)
            .offset(query.offset)
            .limit(query.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Accepted edges from a user to the accounts they follow, newest first.
    pub async fn find_following(
        &self,
        user_id: &str,
        query: &FollowListQuery,
    ) -> AppResult<Vec<follow_edge::Model>> {
        let mut select = FollowEdge::find()
            .filter(follow_edge::Column::FollowerId.eq(user_id))
            .filter(follow_edge::Column::Status.eq(FollowStatus::Accepted));

        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            select = select
                .join(JoinType::InnerJoin, follow_edge::Relation::Followee.def())
                .filter(search_condition(search));
        }

        select
            .order_by_desc(follow_edge::Column::Id)
            .offset(query.offset)
            .limit(query.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of every accepted follower of a user, newest first.
    pub async fn find_follower_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        let edges = FollowEdge::find()
            .filter(follow_edge::Column::FolloweeId.eq(user_id))
            .filter(follow_edge::Column::Status.eq(FollowStatus::Accepted))
            .order_by_desc(follow_edge::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(edges.into_iter().map(|e| e.follower_id).collect())
    }

    /// Pending requests addressed to a user (paginated).
    pub async fn find_pending_received(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<follow_edge::Model>> {
        let mut query = FollowEdge::find()
            .filter(follow_edge::Column::FolloweeId.eq(user_id))
            .filter(follow_edge::Column::Status.eq(FollowStatus::Pending))
            .order_by_desc(follow_edge::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(follow_edge::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Pending requests sent by a user (paginated).
    pub async fn find_pending_sent(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<follow_edge::Model>> {
        let mut query = FollowEdge::find()
            .filter(follow_edge::Column::FollowerId.eq(user_id))
            .filter(follow_edge::Column::Status.eq(FollowStatus::Pending))
            .order_by_desc(follow_edge::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(follow_edge::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Handle or display name contains `search` (case-insensitive).
fn search_condition(search: &str) -> Condition {
    let pattern = contains_pattern(search.trim());
    Condition::any()
        .add(user::Column::UsernameLower.like(pattern.clone()))
        .add(Expr::expr(Func::lower(Expr::col((user::Entity, user::Column::Name)))).like(pattern))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn create_test_edge(
        id: &str,
        follower_id: &str,
        followee_id: &str,
        status: FollowStatus,
    ) -> follow_edge::Model {
        follow_edge::Model {
            id: id.to_string(),
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            status,
            requested_at: Utc::now().into(),
            responded_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_pair_found() {
        let edge = create_test_edge("e1", "alice", "bob", FollowStatus::Accepted);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge.clone()]])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);
        let result = repo.find_by_pair("alice", "bob").await.unwrap();

        let found = result.unwrap();
        assert_eq!(found.follower_id, "alice");
        assert_eq!(found.followee_id, "bob");
    }

    #[tokio::test]
    async fn test_find_by_pair_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<follow_edge::Model>::new()])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);
        let result = repo.find_by_pair("alice", "bob").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_pending_edge() {
        let edge = create_test_edge("e1", "carol", "dave", FollowStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge.clone()]])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);
        let created = repo.create(edge.clone().into()).await.unwrap();

        assert_eq!(created.status, FollowStatus::Pending);
        assert!(created.responded_at.is_none());
    }

    #[tokio::test]
    async fn test_delete_edge() {
        let edge = create_test_edge("e1", "alice", "bob", FollowStatus::Accepted);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);
        repo.delete(edge).await.unwrap();
    }

    #[tokio::test]
    async fn test_count_followers() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[btreemap! {
                    "num_items" => Into::<Value>::into(2i64),
                }]])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);
        assert_eq!(repo.count_followers("bob").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_followers_with_search() {
        let e1 = create_test_edge("e2", "alice", "bob", FollowStatus::Accepted);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[e1]])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);
        let query = FollowListQuery {
            limit: 10,
            offset: 0,
            search: Some("ALI".to_string()),
        };
        let result = repo.find_followers("bob", &query).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].follower_id, "alice");
    }

    #[tokio::test]
    async fn test_find_follower_ids_keeps_order() {
        let e1 = create_test_edge("e3", "carol", "bob", FollowStatus::Accepted);
        let e2 = create_test_edge("e1", "alice", "bob", FollowStatus::Accepted);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[e1, e2]])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);
        let ids = repo.find_follower_ids("bob").await.unwrap();

        assert_eq!(ids, vec!["carol".to_string(), "alice".to_string()]);
    }

    #[tokio::test]
    async fn test_find_pending_received() {
        let edge = create_test_edge("e1", "carol", "dave", FollowStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge]])
                .into_connection(),
        );

        let repo = FollowEdgeRepository::new(db);
        let result = repo.find_pending_received("dave", 10, None).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].status, FollowStatus::Pending);
    }
}
