//! Comment service.

use std::collections::HashMap;

use crate::services::following::FollowingService;
use crate::services::notification::{NotificationEvent, NotificationService};
use crate::views::UserSummary;
use chrono::{DateTime, FixedOffset, Utc};
use inkwell_common::{AppError, AppResult, IdGenerator};
use inkwell_db::{
    entities::{comment, user},
    repositories::{BlogRepository, CommentRepository, UserRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Input for commenting on a blog.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    pub blog_id: String,

    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

/// A comment with its author.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub blog_id: String,
    pub content: String,
    pub likes_count: i32,
    pub created_at: DateTime<FixedOffset>,
    pub author: Option<UserSummary>,
}

impl CommentView {
    fn new(comment: comment::Model, author: Option<UserSummary>) -> Self {
        Self {
            id: comment.id,
            blog_id: comment.blog_id,
            content: comment.content,
            likes_count: comment.likes_count,
            created_at: comment.created_at,
            author,
        }
    }
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    blog_repo: BlogRepository,
    user_repo: UserRepository,
    following_service: FollowingService,
    notification_service: Option<NotificationService>,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        blog_repo: BlogRepository,
        user_repo: UserRepository,
        following_service: FollowingService,
    ) -> Self {
        Self {
            comment_repo,
            blog_repo,
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

    /// Comment on a blog the author may see. Notifies the blog's author.
    pub async fn create(&self, author_id: &str, input: CreateCommentInput) -> AppResult<CommentView> {
        input.validate()?;

        let blog = self.blog_repo.get_by_id(&input.blog_id).await?;
        let owner = self.user_repo.get_by_id(&blog.author_id).await?;
        self.following_service
            .ensure_can_view(Some(author_id), &owner)
            .await?;
        let author = if author_id == owner.id {
            owner
        } else {
            self.user_repo.get_by_id(author_id).await?
        };

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            blog_id: Set(blog.id.clone()),
            author_id: Set(author_id.to_string()),
            content: Set(input.content),
            likes_count: Set(0),
            created_at: Set(Utc::now().into()),
        };
        let comment = self.comment_repo.create(model).await?;

        self.refresh_comments_count(&blog.id).await?;

        if blog.author_id != author_id
            && let Some(ref notification_service) = self.notification_service
            && let Err(e) = notification_service
                .notify(
                    &blog.author_id,
                    author_id,
                    NotificationEvent::BlogCommented {
                        blog_id: blog.id.clone(),
                        comment_id: comment.id.clone(),
                    },
                )
                .await
        {
            tracing::warn!(error = %e, "Failed to create comment notification");
        }

        Ok(CommentView::new(comment, Some(UserSummary::from(&author))))
    }

    /// Comments on a blog, oldest first.
    pub async fn list(
        &self,
        viewer_id: Option<&str>,
        blog_id: &str,
        limit: u64,
        since_id: Option<&str>,
    ) -> AppResult<Vec<CommentView>> {
        let blog = self.blog_repo.get_by_id(blog_id).await?;
        let owner = self.user_repo.get_by_id(&blog.author_id).await?;
        self.following_service
            .ensure_can_view(viewer_id, &owner)
            .await?;

        let comments = self
            .comment_repo
            .find_by_blog(blog_id, limit, since_id)
            .await?;

        let mut author_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(comments
            .into_iter()
            .map(|c| {
                let author = authors.get(&c.author_id).map(UserSummary::from);
                CommentView::new(c, author)
            })
            .collect())
    }

    /// Delete one's own comment, or any comment on one's own blog.
    pub async fn delete(&self, actor_id: &str, comment_id: &str) -> AppResult<()> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        let blog = self.blog_repo.get_by_id(&comment.blog_id).await?;

        if comment.author_id != actor_id && blog.author_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the commenter or the blog author can delete this comment".to_string(),
            ));
        }

        self.comment_repo.delete(comment).await?;
        self.refresh_comments_count(&blog.id).await
    }

    async fn refresh_comments_count(&self, blog_id: &str) -> AppResult<()> {
        let count = self.comment_repo.count_by_blog(blog_id).await?;
        self.blog_repo.set_comments_count(blog_id, count).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::dispatcher::{Dispatcher, RoomRegistry};
    use inkwell_db::entities::blog;
    use inkwell_db::repositories::{FollowEdgeRepository, NotificationRepository};
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
    use std::sync::Arc;
    use tokio::sync::mpsc;

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
            bio: None,
            avatar_url: None,
            avatar_handle: None,
            posts_count: 0,
            followers_count: 0,
            following_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_blog(id: &str, author_id: &str) -> blog::Model {
        blog::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            title: "Hello".to_string(),
            content: "World".to_string(),
            cover_image_url: None,
            cover_image_handle: None,
            is_ai_generated: false,
            likes_count: 0,
            comments_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_comment(id: &str, blog_id: &str, author_id: &str) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            blog_id: blog_id.to_string(),
            author_id: author_id.to_string(),
            content: "Nice".to_string(),
            likes_count: 0,
            created_at: Utc::now().into(),
        }
    }

    fn empty_db() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn service(
        comment_db: Arc<DatabaseConnection>,
        blog_db: Arc<DatabaseConnection>,
        user_db: Arc<DatabaseConnection>,
    ) -> CommentService {
        let user_repo = UserRepository::new(user_db);
        let following_service =
            FollowingService::new(FollowEdgeRepository::new(empty_db()), user_repo.clone());
        CommentService::new(
            CommentRepository::new(comment_db),
            BlogRepository::new(blog_db),
            user_repo,
            following_service,
        )
    }

    #[tokio::test]
    async fn test_create_on_public_blog_refreshes_count() {
        let comment_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_comment("c1", "b1", "bob")]])
                .append_query_results([[btreemap! {
                    "num_items" => Into::<Value>::into(1i64),
                }]])
                .into_connection(),
        );
        let blog_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_blog("b1", "alice")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("alice", false)]])
                .append_query_results([[create_test_user("bob", false)]])
                .into_connection(),
        );

        let input = CreateCommentInput {
            blog_id: "b1".to_string(),
            content: "Nice".to_string(),
        };
        let view = service(comment_db, blog_db, user_db)
            .create("bob", input)
            .await
            .unwrap();

        assert_eq!(view.id, "c1");
        assert_eq!(view.author.unwrap().id, "bob");
    }

    #[tokio::test]
    async fn test_create_empty_content_fails_validation() {
        let input = CreateCommentInput {
            blog_id: "b1".to_string(),
            content: String::new(),
        };
        let result = service(empty_db(), empty_db(), empty_db())
            .create("bob", input)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_by_stranger_is_forbidden() {
        let comment_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_comment("c1", "b1", "bob")]])
                .into_connection(),
        );
        let blog_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_blog("b1", "alice")]])
                .into_connection(),
        );

        let result = service(comment_db, blog_db, empty_db())
            .delete("mallory", "c1")
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_blog_author_may_delete_any_comment() {
        let comment_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_comment("c1", "b1", "bob")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[btreemap! {
                    "num_items" => Into::<Value>::into(0i64),
                }]])
                .into_connection(),
        );
        let blog_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_blog("b1", "alice")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        service(comment_db, blog_db, empty_db())
            .delete("alice", "c1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_comment_on_own_blog_creates_no_notification() {
        let comment_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_comment("c1", "b1", "erin")]])
                .append_query_results([[btreemap! {
                    "num_items" => Into::<Value>::into(1i64),
                }]])
                .into_connection(),
        );
        let blog_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_blog("b1", "erin")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        // The blog owner doubles as the author: one lookup
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("erin", false)]])
                .into_connection(),
        );

        let registry = Arc::new(RoomRegistry::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.register("erin", tx).await;

        let notification_db = empty_db();
        let mut notification_service = NotificationService::new(
            NotificationRepository::new(notification_db.clone()),
            UserRepository::new(empty_db()),
            BlogRepository::new(empty_db()),
        );
        notification_service.set_dispatcher(registry);

        let mut service = service(comment_db, blog_db, user_db);
        service.set_notification_service(notification_service);

        let input = CreateCommentInput {
            blog_id: "b1".to_string(),
            content: "Thanks for reading".to_string(),
        };
        let view = service.create("erin", input).await.unwrap();
        assert_eq!(view.author.unwrap().id, "erin");
        drop(service);

        let log = Arc::try_unwrap(notification_db)
            .unwrap()
            .into_transaction_log();
        assert!(log.is_empty());
        assert!(rx.try_recv().is_err());
    }
}
