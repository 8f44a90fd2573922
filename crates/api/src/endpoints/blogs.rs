//! Blog endpoints.

use axum::{Router, extract::State, routing::post};
use inkwell_common::AppResult;
use inkwell_core::{BlogView, CreateBlogInput, LikeToggle};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, Json, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, Empty},
};

/// Single blog response.
#[derive(Serialize)]
pub struct BlogResponse {
    pub blog: BlogView,
}

/// Publish a blog post.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateBlogInput>,
) -> AppResult<ApiResponse<BlogResponse>> {
    let blog = state.blog_service.create(&user.id, req).await?;
    Ok(ApiResponse::with_message("Blog published", BlogResponse { blog }))
}

/// Request naming a blog.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogRequest {
    pub blog_id: String,
}

/// Read a blog post.
async fn show(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<BlogRequest>,
) -> AppResult<ApiResponse<BlogResponse>> {
    let blog = state.blog_service.show(viewer.id(), &req.blog_id).await?;
    Ok(ApiResponse::ok(BlogResponse { blog }))
}

/// Author listing parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBlogsRequest {
    pub user_id: String,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

const fn default_limit() -> u64 {
    10
}

/// Blog list response.
#[derive(Serialize)]
pub struct BlogsResponse {
    pub blogs: Vec<BlogView>,
}

/// An author's posts, newest first.
async fn list(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListBlogsRequest>,
) -> AppResult<ApiResponse<BlogsResponse>> {
    let blogs = state
        .blog_service
        .list_by_author(
            viewer.id(),
            &req.user_id,
            req.limit.min(100),
            req.until_id.as_deref(),
        )
        .await?;
    Ok(ApiResponse::ok(BlogsResponse { blogs }))
}

/// Delete one of the caller's posts.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<BlogRequest>,
) -> AppResult<ApiResponse<Empty>> {
    state.blog_service.delete(&user.id, &req.blog_id).await?;
    Ok(ApiResponse::message("Blog deleted"))
}

/// Like a post, or take the like back.
async fn like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<BlogRequest>,
) -> AppResult<ApiResponse<LikeToggle>> {
    let toggle = state
        .like_service
        .toggle_blog_like(&user.id, &req.blog_id)
        .await?;
    Ok(ApiResponse::ok(toggle))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/show", post(show))
        .route("/list", post(list))
        .route("/delete", post(delete))
        .route("/like", post(like))
}
