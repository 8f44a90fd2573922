//! Account lifecycle endpoints.

use axum::{Router, extract::State, routing::post};
use inkwell_common::AppResult;
use inkwell_core::{SignupInput, UserSummary};
use serde::{Deserialize, Serialize};

use crate::{extractors::Json, middleware::AppState, response::ApiResponse};

/// Signup response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub user: UserSummary,
}

/// Create an inactive account and mail its activation link.
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupInput>,
) -> AppResult<ApiResponse<SignupResponse>> {
    let user = state.account_service.signup(req).await?;

    Ok(ApiResponse::with_message(
        "Account created. Check your email to activate it.",
        SignupResponse {
            user: UserSummary::from(&user),
        },
    ))
}

/// Activation request.
#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub token: String,
}

/// Session response carrying the bearer credential.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Activate an account from its emailed link.
async fn activate(
    State(state): State<AppState>,
    Json(req): Json<ActivateRequest>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let user = state.account_service.activate(&req.token).await?;

    Ok(ApiResponse::with_message(
        "Account activated",
        SessionResponse {
            token: user.token.clone().unwrap_or_default(),
            user: UserSummary::from(&user),
        },
    ))
}

/// Signin request.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    /// Handle or email address.
    pub login: String,
    pub password: String,
}

/// Sign in with a handle or email address.
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let user = state
        .account_service
        .signin(&req.login, &req.password)
        .await?;

    Ok(ApiResponse::ok(SessionResponse {
        token: user.token.clone().unwrap_or_default(),
        user: UserSummary::from(&user),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/activate", post(activate))
        .route("/signin", post(signin))
}
