//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use inkwell_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find users by IDs.
    ///
    /// Order of the result is unspecified; callers re-order by their own keys.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by handle (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::UsernameLower.eq(username.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by handle or email address, for sign-in.
    pub async fn find_by_login(&self, login: &str) -> AppResult<Option<user::Model>> {
        let lowered = login.to_lowercase();
        User::find()
            .filter(
                Condition::any()
                    .add(user::Column::UsernameLower.eq(lowered.clone()))
                    .add(user::Column::Email.eq(lowered)),
            )
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find any user already holding one of the given unique identifiers.
    pub async fn find_conflicting(
        &self,
        username: &str,
        email: &str,
        phone: &str,
    ) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(
                Condition::any()
                    .add(user::Column::UsernameLower.eq(username.to_lowercase()))
                    .add(user::Column::Email.eq(email.to_lowercase()))
                    .add(user::Column::Phone.eq(phone)),
            )
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by bearer token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by a pending activation token.
    pub async fn find_by_activation_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::ActivationToken.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Overwrite the cached follower count (single UPDATE query, no fetch).
    pub async fn set_followers_count(&self, user_id: &str, count: u64) -> AppResult<()> {
        self.set_counter(user_id, user::Column::FollowersCount, count)
            .await
    }

    /// Overwrite the cached following count (single UPDATE query, no fetch).
    pub async fn set_following_count(&self, user_id: &str, count: u64) -> AppResult<()> {
        self.set_counter(user_id, user::Column::FollowingCount, count)
            .await
    }

    /// Overwrite the cached posts count (single UPDATE query, no fetch).
    pub async fn set_posts_count(&self, user_id: &str, count: u64) -> AppResult<()> {
        self.set_counter(user_id, user::Column::PostsCount, count)
            .await
    }

    async fn set_counter(&self, user_id: &str, column: user::Column, count: u64) -> AppResult<()> {
        let count = i32::try_from(count).unwrap_or(i32::MAX);
        User::update_many()
            .col_expr(column, Expr::value(count))
            .filter(user::Column::Id.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Activate an account: clears the single-use activation token and
    /// stores the issued bearer token.
    pub async fn activate(&self, user: user::Model, token: String) -> AppResult<user::Model> {
        let mut active: user::ActiveModel = user.into();
        active.is_active = Set(true);
        active.activation_token = Set(None);
        active.activation_expires_at = Set(None);
        active.token = Set(Some(token));
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.update(active).await
    }
}
