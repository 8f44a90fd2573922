//! Own-account endpoints.

use axum::{Router, extract::State, routing::post};
use chrono::{DateTime, FixedOffset};
use inkwell_common::AppResult;
use inkwell_core::UpdateProfileInput;
use inkwell_db::entities::user;
use serde::Serialize;

use crate::{
    extractors::{AuthUser, Json},
    middleware::AppState,
    response::ApiResponse,
};

/// The signed-in account, including fields only its owner sees.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: String,
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub is_private: bool,
    pub followers_count: i32,
    pub following_count: i32,
    pub posts_count: i32,
    pub created_at: DateTime<FixedOffset>,
}

impl From<user::Model> for MeResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            email: user.email,
            phone: user.phone,
            bio: user.bio,
            avatar_url: user.avatar_url,
            is_private: user.is_private,
            followers_count: user.followers_count,
            following_count: user.following_count,
            posts_count: user.posts_count,
            created_at: user.created_at,
        }
    }
}

/// Get the signed-in account.
async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MeResponse>> {
    // Re-read so counters are current
    let user = state.account_service.get(&user.id).await?;
    Ok(ApiResponse::ok(MeResponse::from(user)))
}

/// Edit the signed-in account's profile.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<MeResponse>> {
    let user = state.account_service.update_profile(&user.id, req).await?;
    Ok(ApiResponse::with_message(
        "Profile updated",
        MeResponse::from(user),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(me))
        .route("/update", post(update))
}
