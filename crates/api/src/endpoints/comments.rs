//! Comment endpoints.

use axum::{Router, extract::State, routing::post};
use inkwell_common::AppResult;
use inkwell_core::{CommentView, CreateCommentInput, LikeToggle};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, Json, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, Empty},
};

/// Single comment response.
#[derive(Serialize)]
pub struct CommentResponse {
    pub comment: CommentView,
}

/// Comment on a blog.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateCommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.create(&user.id, req).await?;
    Ok(ApiResponse::ok(CommentResponse { comment }))
}

/// Comment listing parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsRequest {
    pub blog_id: String,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Cursor for forward pagination (after this ID)
    pub since_id: Option<String>,
}

const fn default_limit() -> u64 {
    20
}

/// Comment list response.
#[derive(Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<CommentView>,
}

/// Comments on a blog, oldest first.
async fn list(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListCommentsRequest>,
) -> AppResult<ApiResponse<CommentsResponse>> {
    let comments = state
        .comment_service
        .list(
            viewer.id(),
            &req.blog_id,
            req.limit.min(100),
            req.since_id.as_deref(),
        )
        .await?;
    Ok(ApiResponse::ok(CommentsResponse { comments }))
}

/// Request naming a comment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub comment_id: String,
}

/// Delete a comment the caller wrote, or one on the caller's blog.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CommentRequest>,
) -> AppResult<ApiResponse<Empty>> {
    state
        .comment_service
        .delete(&user.id, &req.comment_id)
        .await?;
    Ok(ApiResponse::message("Comment deleted"))
}

/// Like a comment, or take the like back.
async fn like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CommentRequest>,
) -> AppResult<ApiResponse<LikeToggle>> {
    let toggle = state
        .like_service
        .toggle_comment_like(&user.id, &req.comment_id)
        .await?;
    Ok(ApiResponse::ok(toggle))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/list", post(list))
        .route("/delete", post(delete))
        .route("/like", post(like))
}
