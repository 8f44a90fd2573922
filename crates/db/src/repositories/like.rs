//! Like repository.

use std::sync::Arc;

use crate::entities::{Like, like};
use inkwell_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter,
};

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's like on a blog.
    pub async fn find_blog_like(
        &self,
        user_id: &str,
        blog_id: &str,
    ) -> AppResult<Option<like::Model>> {
        Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::BlogId.eq(blog_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's like on a comment.
    pub async fn find_comment_like(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> AppResult<Option<like::Model>> {
        Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::CommentId.eq(comment_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Which of `blog_ids` the user has liked.
    pub async fn find_liked_blog_ids(
        &self,
        user_id: &str,
        blog_ids: &[String],
    ) -> AppResult<Vec<String>> {
        if blog_ids.is_empty() {
            return Ok(vec![]);
        }

        let likes = Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::BlogId.is_in(blog_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(likes.into_iter().filter_map(|l| l.blog_id).collect())
    }

    /// Create a new like.
    pub async fn create(&self, model: like::ActiveModel) -> AppResult<like::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| super::insert_error(e, "Like"))
    }

    /// Delete a like.
    pub async fn delete(&self, like: like::Model) -> AppResult<()> {
        like.delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count likes on a blog.
    pub async fn count_by_blog(&self, blog_id: &str) -> AppResult<u64> {
        Like::find()
            .filter(like::Column::BlogId.eq(blog_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count likes on a comment.
    pub async fn count_by_comment(&self, comment_id: &str) -> AppResult<u64> {
        Like::find()
            .filter(like::Column::CommentId.eq(comment_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    #[tokio::test]
    async fn test_find_blog_like_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<like::Model>::new()])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(repo.find_blog_like("erin", "b1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_comment_like_found() {
        let like = like::Model {
            id: "l1".to_string(),
            user_id: "bob".to_string(),
            blog_id: None,
            comment_id: Some("c1".to_string()),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let found = repo.find_comment_like("bob", "c1").await.unwrap().unwrap();
        assert!(found.blog_id.is_none());
        assert_eq!(found.comment_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_count_by_blog() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[btreemap! {
                    "num_items" => Into::<Value>::into(1i64),
                }]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert_eq!(repo.count_by_blog("b1").await.unwrap(), 1);
    }
}
