//! Blog service.

use std::collections::HashSet;

use crate::services::following::FollowingService;
use crate::views::UserSummary;
use chrono::{DateTime, FixedOffset, Utc};
use inkwell_common::{AppError, AppResult, IdGenerator};
use inkwell_db::{
    entities::{blog, user},
    repositories::{BlogRepository, LikeRepository, UserRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Input for writing a blog post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 100_000))]
    pub content: String,

    /// Public URL returned by object storage.
    #[validate(length(max = 1024))]
    pub cover_image_url: Option<String>,

    /// Opaque deletion handle returned by object storage.
    #[validate(length(max = 256))]
    pub cover_image_handle: Option<String>,

    /// Drafted by the text generation service
    #[serde(default)]
    pub is_ai_generated: bool,
}

/// A blog post with its author, as seen by a viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub is_ai_generated: bool,
    pub likes_count: i32,
    pub comments_count: i32,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub author: UserSummary,
    pub is_liked: bool,
}

impl BlogView {
    fn new(blog: blog::Model, author: &user::Model, is_liked: bool) -> Self {
        Self {
            id: blog.id,
            title: blog.title,
            content: blog.content,
            cover_image_url: blog.cover_image_url,
            is_ai_generated: blog.is_ai_generated,
            likes_count: blog.likes_count,
            comments_count: blog.comments_count,
            created_at: blog.created_at,
            updated_at: blog.updated_at,
            author: UserSummary::from(author),
            is_liked,
        }
    }
}

/// Blog service for business logic.
#[derive(Clone)]
pub struct BlogService {
    blog_repo: BlogRepository,
    user_repo: UserRepository,
    like_repo: LikeRepository,
    following_service: FollowingService,
    id_gen: IdGenerator,
}

impl BlogService {
    /// Create a new blog service.
    #[must_use]
    pub const fn new(
        blog_repo: BlogRepository,
        user_repo: UserRepository,
        like_repo: LikeRepository,
        following_service: FollowingService,
    ) -> Self {
        Self {
            blog_repo,
            user_repo,
            like_repo,
            following_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Publish a blog post.
    pub async fn create(&self, author_id: &str, input: CreateBlogInput) -> AppResult<BlogView> {
        input.validate()?;

        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("Title must not be blank".to_string()));
        }

        let author = self.user_repo.get_by_id(author_id).await?;

        let model = blog::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            title: Set(title),
            content: Set(input.content),
            cover_image_url: Set(input.cover_image_url),
            cover_image_handle: Set(input.cover_image_handle),
            is_ai_generated: Set(input.is_ai_generated),
            likes_count: Set(0),
            comments_count: Set(0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        let blog = self.blog_repo.create(model).await?;

        self.refresh_posts_count(author_id).await?;

        tracing::info!(blog_id = %blog.id, author_id = %author_id, "Created blog");
        Ok(BlogView::new(blog, &author, false))
    }

    /// Read a blog post, subject to the author's privacy.
    pub async fn show(&self, viewer_id: Option<&str>, blog_id: &str) -> AppResult<BlogView> {
        let blog = self.blog_repo.get_by_id(blog_id).await?;
        let author = self.user_repo.get_by_id(&blog.author_id).await?;
        self.following_service
            .ensure_can_view(viewer_id, &author)
            .await?;

        let is_liked = match viewer_id {
            Some(viewer_id) => self
                .like_repo
                .find_blog_like(viewer_id, &blog.id)
                .await?
                .is_some(),
            None => false,
        };

        Ok(BlogView::new(blog, &author, is_liked))
    }

    /// An author's posts, newest first, subject to the author's privacy.
    pub async fn list_by_author(
        &self,
        viewer_id: Option<&str>,
        author_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<BlogView>> {
        let author = self.user_repo.get_by_id(author_id).await?;
        self.following_service
            .ensure_can_view(viewer_id, &author)
            .await?;

        let blogs = self
            .blog_repo
            .find_by_author(author_id, limit, until_id)
            .await?;

        let liked: HashSet<String> = match viewer_id {
            Some(viewer_id) => {
                let ids: Vec<String> = blogs.iter().map(|b| b.id.clone()).collect();
                self.like_repo
                    .find_liked_blog_ids(viewer_id, &ids)
                    .await?
                    .into_iter()
                    .collect()
            }
            None => HashSet::new(),
        };

        Ok(blogs
            .into_iter()
            .map(|b| {
                let is_liked = liked.contains(&b.id);
                BlogView::new(b, &author, is_liked)
            })
            .collect())
    }

    /// Delete one's own blog post.
    pub async fn delete(&self, actor_id: &str, blog_id: &str) -> AppResult<()> {
        let blog = self.blog_repo.get_by_id(blog_id).await?;
        if blog.author_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the author can delete this blog".to_string(),
            ));
        }

        self.blog_repo.delete(blog).await?;
        self.refresh_posts_count(actor_id).await?;

        tracing::info!(blog_id = %blog_id, "Deleted blog");
        Ok(())
    }

    async fn refresh_posts_count(&self, author_id: &str) -> AppResult<()> {
        let count = self.blog_repo.count_by_author(author_id).await?;
        self.user_repo.set_posts_count(author_id, count).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use inkwell_db::entities::like;
    use inkwell_db::repositories::FollowEdgeRepository;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
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

    fn empty_db() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn service(
        blog_db: Arc<DatabaseConnection>,
        user_db: Arc<DatabaseConnection>,
        like_db: Arc<DatabaseConnection>,
        follow_db: Arc<DatabaseConnection>,
    ) -> BlogService {
        let user_repo = UserRepository::new(user_db);
        let following_service =
            FollowingService::new(FollowEdgeRepository::new(follow_db), user_repo.clone());
        BlogService::new(
            BlogRepository::new(blog_db),
            user_repo,
            LikeRepository::new(like_db),
            following_service,
        )
    }

    #[tokio::test]
    async fn test_create_refreshes_posts_count() {
        let blog_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_blog("b1", "erin")]])
                .append_query_results([[btreemap! {
                    "num_items" => Into::<Value>::into(1i64),
                }]])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("erin", false)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let input = CreateBlogInput {
            title: "Hello".to_string(),
            content: "World".to_string(),
            cover_image_url: None,
            cover_image_handle: None,
            is_ai_generated: false,
        };
        let view = service(blog_db, user_db, empty_db(), empty_db())
            .create("erin", input)
            .await
            .unwrap();

        assert_eq!(view.id, "b1");
        assert_eq!(view.author.id, "erin");
    }

    #[tokio::test]
    async fn test_create_blank_title_fails() {
        let input = CreateBlogInput {
            title: "   ".to_string(),
            content: "World".to_string(),
            cover_image_url: None,
            cover_image_handle: None,
            is_ai_generated: false,
        };
        let result = service(empty_db(), empty_db(), empty_db(), empty_db())
            .create("erin", input)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_show_private_blog_to_stranger_is_forbidden() {
        let blog_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_blog("b1", "dave")]])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("dave", true)]])
                .into_connection(),
        );

        let result = service(blog_db, user_db, empty_db(), empty_db())
            .show(None, "b1")
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_show_marks_liked() {
        let blog_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_blog("b1", "alice")]])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("alice", false)]])
                .into_connection(),
        );
        let like_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like::Model {
                    id: "l1".to_string(),
                    user_id: "bob".to_string(),
                    blog_id: Some("b1".to_string()),
                    comment_id: None,
                    created_at: Utc::now().into(),
                }]])
                .into_connection(),
        );

        let view = service(blog_db, user_db, like_db, empty_db())
            .show(Some("bob"), "b1")
            .await
            .unwrap();
        assert!(view.is_liked);
    }

    #[tokio::test]
    async fn test_delete_other_authors_blog_is_forbidden() {
        let blog_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_blog("b1", "alice")]])
                .into_connection(),
        );

        let result = service(blog_db, empty_db(), empty_db(), empty_db())
            .delete("bob", "b1")
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
