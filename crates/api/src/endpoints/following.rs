//! Following endpoints.

use axum::{Router, extract::State, routing::post};
use inkwell_common::AppResult;
use inkwell_core::{FollowRequestView, RelationStatus, UserSummary};
use inkwell_db::{entities::follow_edge::FollowStatus, repositories::FollowListQuery};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, Json, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, Empty},
};

/// Request naming the other account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub user_id: String,
}

/// Follow result response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub request_id: String,
    pub status: RelationStatus,
}

/// Follow a user, or ask to if their account is private.
async fn follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FollowRequest>,
) -> AppResult<ApiResponse<FollowResponse>> {
    let edge = state
        .following_service
        .request_follow(&user.id, &req.user_id)
        .await?;

    let (message, status) = match edge.status {
        FollowStatus::Pending => ("Follow request sent", RelationStatus::Pending),
        _ => ("Now following", RelationStatus::Following),
    };

    Ok(ApiResponse::with_message(
        message,
        FollowResponse {
            request_id: edge.id,
            status,
        },
    ))
}

/// Unfollow a user, or withdraw a pending request.
async fn unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FollowRequest>,
) -> AppResult<ApiResponse<Empty>> {
    state
        .following_service
        .unfollow(&user.id, &req.user_id)
        .await?;
    Ok(ApiResponse::message("Unfollowed"))
}

/// Status response.
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: RelationStatus,
}

/// Relationship of the caller to another account.
async fn status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FollowRequest>,
) -> AppResult<ApiResponse<StatusResponse>> {
    let status = state
        .following_service
        .status(&user.id, &req.user_id)
        .await?;
    Ok(ApiResponse::ok(StatusResponse { status }))
}

/// Request naming a follow request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    pub request_id: String,
}

/// Accept a follow request addressed to the caller.
async fn accept(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<RespondRequest>,
) -> AppResult<ApiResponse<Empty>> {
    state
        .following_service
        .accept_request(&req.request_id, &user.id)
        .await?;
    Ok(ApiResponse::message("Follow request accepted"))
}

/// Reject a follow request addressed to the caller.
async fn reject(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<RespondRequest>,
) -> AppResult<ApiResponse<Empty>> {
    state
        .following_service
        .reject_request(&req.request_id, &user.id)
        .await?;
    Ok(ApiResponse::message("Follow request rejected"))
}

/// Pending request list parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

const fn default_limit() -> u64 {
    10
}

/// Pending requests response.
#[derive(Serialize)]
pub struct RequestsResponse {
    pub requests: Vec<FollowRequestView>,
}

/// Pending requests addressed to the caller.
async fn list_requests(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<RequestsQuery>,
) -> AppResult<ApiResponse<RequestsResponse>> {
    let requests = state
        .following_service
        .pending_requests(&user.id, req.limit.min(100), req.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(RequestsResponse { requests }))
}

/// Pending requests the caller has sent.
async fn sent_requests(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<RequestsQuery>,
) -> AppResult<ApiResponse<RequestsResponse>> {
    let requests = state
        .following_service
        .sent_requests(&user.id, req.limit.min(100), req.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(RequestsResponse { requests }))
}

/// Follower/following list parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    pub user_id: String,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    pub search: Option<String>,
}

impl ListRequest {
    fn query(&self) -> FollowListQuery {
        FollowListQuery {
            limit: self.limit.min(100),
            offset: self.offset,
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// Users list response.
#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}

/// Accounts following a user.
async fn followers(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<UsersResponse>> {
    let users = state
        .following_service
        .followers(viewer.id(), &req.user_id, &req.query())
        .await?;
    Ok(ApiResponse::ok(UsersResponse { users }))
}

/// Accounts a user follows.
async fn following(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<UsersResponse>> {
    let users = state
        .following_service
        .following(viewer.id(), &req.user_id, &req.query())
        .await?;
    Ok(ApiResponse::ok(UsersResponse { users }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(follow))
        .route("/delete", post(unfollow))
        .route("/status", post(status))
        .route("/requests/accept", post(accept))
        .route("/requests/reject", post(reject))
        .route("/requests/list", post(list_requests))
        .route("/requests/sent", post(sent_requests))
        .route("/followers", post(followers))
        .route("/following", post(following))
}
