//! Notifications endpoints.

use axum::{Router, extract::State, routing::post};
use inkwell_common::AppResult;
use inkwell_core::NotificationView;
use inkwell_db::{entities::notification::NotificationType, repositories::NotificationQuery};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, Json},
    middleware::AppState,
    response::{ApiResponse, Empty},
};

/// List notifications request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsRequest {
    /// Maximum results (default: 10, max: 100)
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Cursor for pagination (before this ID)
    pub until_id: Option<String>,
    #[serde(default)]
    pub unread_only: bool,
    /// Include only these types; empty means all
    #[serde(default)]
    pub types: Vec<NotificationType>,
    /// Include the unread count alongside the page
    #[serde(default)]
    pub with_unread_count: bool,
}

const fn default_limit() -> u64 {
    10
}

/// Notifications page.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsListResponse {
    pub notifications: Vec<NotificationView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u64>,
}

/// List the caller's notifications, newest first.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListNotificationsRequest>,
) -> AppResult<ApiResponse<NotificationsListResponse>> {
    let query = NotificationQuery {
        limit: req.limit.min(100),
        until_id: req.until_id,
        unread_only: req.unread_only,
        types: req.types,
    };
    let notifications = state.notification_service.list(&user.id, &query).await?;

    let unread_count = if req.with_unread_count {
        Some(state.notification_service.unread_count(&user.id).await?)
    } else {
        None
    };

    Ok(ApiResponse::ok(NotificationsListResponse {
        notifications,
        unread_count,
    }))
}

/// Unread count response.
#[derive(Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Count the caller's unread notifications.
async fn unread_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state.notification_service.unread_count(&user.id).await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

/// Request naming a notification.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub notification_id: String,
}

/// Mark one notification as read.
async fn mark_as_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<NotificationRequest>,
) -> AppResult<ApiResponse<Empty>> {
    state
        .notification_service
        .mark_as_read(&user.id, &req.notification_id)
        .await?;
    Ok(ApiResponse::message("Notification marked as read"))
}

/// Mark-all response.
#[derive(Serialize)]
pub struct MarkAllResponse {
    pub updated: u64,
}

/// Mark all of the caller's notifications as read.
async fn mark_all_as_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MarkAllResponse>> {
    let updated = state.notification_service.mark_all_as_read(&user.id).await?;
    Ok(ApiResponse::with_message(
        "All notifications marked as read",
        MarkAllResponse { updated },
    ))
}

/// Delete one notification.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<NotificationRequest>,
) -> AppResult<ApiResponse<Empty>> {
    state
        .notification_service
        .delete(&user.id, &req.notification_id)
        .await?;
    Ok(ApiResponse::message("Notification deleted"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(list))
        .route("/unread-count", post(unread_count))
        .route("/mark-as-read", post(mark_as_read))
        .route("/mark-all-as-read", post(mark_all_as_read))
        .route("/delete", post(delete))
}
