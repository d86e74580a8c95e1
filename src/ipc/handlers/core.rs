use serde_json::json;
use std::path::PathBuf;

use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::param_str;
use crate::ipc::types::{AppState, Request};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "backendUrl": state.api.base_url(),
            "role": state.session.role(),
            "authenticated": state.session.is_authenticated(),
        }),
    )
}

/// Selects the workspace directory and attaches its database to the session
/// store, restoring any persisted role/token. Without a workspace the
/// session simply stays memory-only, so open failure is a real error here
/// but persistence elsewhere never is.
fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = param_str(req, "path").map(PathBuf::from);
    let Some(path) = path else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match db::open_db(&path) {
        Ok(conn) => {
            state.workspace = Some(path.clone());
            state.session.attach_storage(conn);
            ok(
                &req.id,
                json!({
                    "workspacePath": path.to_string_lossy(),
                    "role": state.session.role(),
                    "authenticated": state.session.is_authenticated(),
                }),
            )
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

fn handle_backend_configure(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(base_url) = param_str(req, "baseUrl").map(str::trim).filter(|s| !s.is_empty())
    else {
        return err(&req.id, "bad_params", "missing params.baseUrl", None);
    };
    state.api.set_base_url(base_url);
    tracing::info!(base_url, "backend endpoint configured");
    ok(&req.id, json!({ "backendUrl": state.api.base_url() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "backend.configure" => Some(handle_backend_configure(state, req)),
        _ => None,
    }
}
