//! Database repositories.

mod blog;
mod comment;
mod follow_edge;
mod like;
mod notification;
mod user;

pub use blog::BlogRepository;
pub use comment::CommentRepository;
pub use follow_edge::{FollowEdgeRepository, FollowListQuery};
pub use like::LikeRepository;
pub use notification::{NotificationQuery, NotificationRepository};
pub use user::UserRepository;

use inkwell_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Map an insert failure, reporting unique-key clashes as conflicts.
pub(crate) fn insert_error(err: DbErr, what: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(detail = %detail, "Unique constraint rejected insert");
            AppError::Conflict(format!("{what} already exists"))
        }
        _ => AppError::Database(err.to_string()),
    }
}

/// Build a case-insensitive `LIKE` pattern matching `query` anywhere.
pub(crate) fn contains_pattern(query: &str) -> String {
    let escaped = query
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
