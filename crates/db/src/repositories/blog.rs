//! Blog repository.

use std::sync::Arc;

use crate::entities::{Blog, blog};
use inkwell_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

/// Blog repository for database operations.
#[derive(Clone)]
pub struct BlogRepository {
    db: Arc<DatabaseConnection>,
}

impl BlogRepository {
    /// Create a new blog repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a blog by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<blog::Model>> {
        Blog::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a blog by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<blog::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::BlogNotFound(id.to_string()))
    }

    /// Find blogs by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<blog::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Blog::find()
            .filter(blog::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new blog.
    pub async fn create(&self, model: blog::ActiveModel) -> AppResult<blog::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a blog (comments and likes cascade).
    pub async fn delete(&self, blog: blog::Model) -> AppResult<()> {
        blog.delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get blogs by an author (paginated, newest first).
    pub async fn find_by_author(
        &self,
        author_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<blog::Model>> {
        let mut query = Blog::find()
            .filter(blog::Column::AuthorId.eq(author_id))
            .order_by_desc(blog::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(blog::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count blogs written by an author.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        Blog::find()
            .filter(blog::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Overwrite the cached like count.
    pub async fn set_likes_count(&self, blog_id: &str, count: u64) -> AppResult<()> {
        self.set_counter(blog_id, blog::Column::LikesCount, count)
            .await
    }

    /// Overwrite the cached comment count.
    pub async fn set_comments_count(&self, blog_id: &str, count: u64) -> AppResult<()> {
        self.set_counter(blog_id, blog::Column::CommentsCount, count)
            .await
    }

    async fn set_counter(&self, blog_id: &str, column: blog::Column, count: u64) -> AppResult<()> {
        let count = i32::try_from(count).unwrap_or(i32::MAX);
        Blog::update_many()
            .col_expr(column, Expr::value(count))
            .filter(blog::Column::Id.eq(blog_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
