use serde_json::json;

use crate::api::{ApiError, LOGIN_REDIRECT};

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Maps a backend failure onto the IPC error shape. A 401 carries the
/// unauthenticated entry point so the shell can navigate; the session has
/// already been cleared before this runs.
pub fn api_failure(id: &str, e: &ApiError, fallback: &str) -> serde_json::Value {
    match e {
        ApiError::Unauthorized => err(
            id,
            "unauthorized",
            e.user_message(fallback),
            Some(json!({ "redirectTo": LOGIN_REDIRECT })),
        ),
        ApiError::Backend { status, .. } => err(
            id,
            "backend_error",
            e.user_message(fallback),
            Some(json!({ "status": status })),
        ),
        ApiError::Transport(_) => err(id, "network_error", e.user_message(fallback), None),
        ApiError::Decode(_) => err(id, "bad_response", e.user_message(fallback), None),
    }
}
