//! API response envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Success envelope: `{"success": true, "message"?: ..., ...payload}`.
///
/// The payload is flattened into the envelope, so `T` must serialize as a
/// map or struct. Errors are rendered by `AppError` with the same shape.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

/// Payload for responses that only carry a message.
#[derive(Debug, Default, Serialize)]
pub struct Empty {}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    /// Create a success response with a human-readable message.
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

impl ApiResponse<Empty> {
    /// Success response without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self::with_message(message, Empty {})
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Count {
        count: u64,
    }

    #[test]
    fn test_payload_is_flattened() {
        let value = serde_json::to_value(ApiResponse::ok(Count { count: 3 })).unwrap();
        assert_eq!(value, json!({"success": true, "count": 3}));
    }

    #[test]
    fn test_message_only() {
        let value = serde_json::to_value(ApiResponse::message("Unfollowed")).unwrap();
        assert_eq!(value, json!({"success": true, "message": "Unfollowed"}));
    }
}
