//! User profile endpoints.

use axum::{Router, extract::State, routing::post};
use inkwell_common::{AppError, AppResult};
use inkwell_core::ProfileView;
use serde::Deserialize;

use crate::{
    extractors::{Json, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Show user request. One of `userId` or `username` is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowUserRequest {
    pub user_id: Option<String>,
    pub username: Option<String>,
}

/// Show a profile as seen by the caller.
async fn show(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowUserRequest>,
) -> AppResult<ApiResponse<ProfileView>> {
    let profile = match (req.user_id, req.username) {
        (Some(user_id), _) => state.profile_service.show(viewer.id(), &user_id).await?,
        (None, Some(username)) => {
            state
                .profile_service
                .show_by_username(viewer.id(), &username)
                .await?
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "userId or username is required".to_string(),
            ));
        }
    };

    Ok(ApiResponse::ok(profile))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/show", post(show))
}
