//! Application state and request middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use inkwell_common::Config;
use inkwell_core::{
    AccountService, BlogService, CommentService, DispatcherService, FollowingService,
    LikeService, MailerService, NotificationService, ProfileService,
};
use inkwell_db::repositories::{
    BlogRepository, CommentRepository, FollowEdgeRepository, LikeRepository,
    NotificationRepository, UserRepository,
};
use sea_orm::DatabaseConnection;

use crate::extractors::bearer_token;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub profile_service: ProfileService,
    pub following_service: FollowingService,
    pub notification_service: NotificationService,
    pub blog_service: BlogService,
    pub comment_service: CommentService,
    pub like_service: LikeService,
    pub dispatcher: DispatcherService,
}

impl AppState {
    /// Wire repositories and services around one connection pool.
    ///
    /// Every service that emits notifications shares the same
    /// [`NotificationService`], which pushes through `dispatcher`.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        dispatcher: DispatcherService,
        mailer: MailerService,
        config: &Config,
    ) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let follow_repo = FollowEdgeRepository::new(Arc::clone(&db));
        let notification_repo = NotificationRepository::new(Arc::clone(&db));
        let blog_repo = BlogRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let like_repo = LikeRepository::new(db);

        let mut notification_service =
            NotificationService::new(notification_repo, user_repo.clone(), blog_repo.clone());
        notification_service.set_dispatcher(Arc::clone(&dispatcher));

        let mut following_service = FollowingService::new(follow_repo.clone(), user_repo.clone());
        following_service.set_notification_service(notification_service.clone());

        let account_service = AccountService::new(
            user_repo.clone(),
            mailer,
            config.server.url.clone(),
            config.auth.activation_ttl_hours,
        );
        let profile_service = ProfileService::new(
            user_repo.clone(),
            follow_repo,
            blog_repo.clone(),
            following_service.clone(),
        );
        let blog_service = BlogService::new(
            blog_repo.clone(),
            user_repo.clone(),
            like_repo.clone(),
            following_service.clone(),
        );

        let mut comment_service = CommentService::new(
            comment_repo.clone(),
            blog_repo.clone(),
            user_repo.clone(),
            following_service.clone(),
        );
        comment_service.set_notification_service(notification_service.clone());

        let mut like_service = LikeService::new(
            like_repo,
            blog_repo,
            comment_repo,
            user_repo,
            following_service.clone(),
        );
        like_service.set_notification_service(notification_service.clone());

        Self {
            account_service,
            profile_service,
            following_service,
            notification_service,
            blog_service,
            comment_service,
            like_service,
            dispatcher,
        }
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer` to an active account and stores it in
/// the request extensions. Unknown tokens leave the request anonymous;
/// endpoints that need an account reject it through [`crate::extractors::AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(req.headers()).map(str::to_string) {
        match state.account_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring bearer token");
            }
        }
    }

    next.run(req).await
}
