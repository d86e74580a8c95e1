use serde_json::json;

use crate::api::RoleUpdateRequest;
use crate::identity::{GateError, PROBE_DELAY};
use crate::ipc::error::{api_failure, err, ok};
use crate::ipc::helpers::{param_bool, param_str, require_role};
use crate::ipc::types::{AppState, Request};
use crate::session::Role;

const DASHBOARD_REDIRECT: &str = "/overview";

fn profile_json(state: &AppState) -> serde_json::Value {
    match state.session.profile() {
        Some(p) => json!({
            "name": p.name,
            "email": p.email,
            "picture": p.picture,
            "sub": p.sub,
        }),
        None => serde_json::Value::Null,
    }
}

/// Credential login for the admin console. Non-admin accounts are refused
/// here without touching the session; they sign in through the regular
/// entry point.
fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let username = param_str(req, "username").map(str::trim).unwrap_or_default();
    let password = param_str(req, "password").map(str::trim).unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return err(
            &req.id,
            "bad_params",
            "Please enter both username and password.",
            None,
        );
    }

    match state.api.login_admin(username, password) {
        Ok(login) => {
            let role = login.role.as_deref().map(Role::parse);
            if role != Some(Role::Admin) {
                return err(
                    &req.id,
                    "admin_only",
                    "Invalid admin credentials. Only admin users can sign in here.",
                    None,
                );
            }
            state.session.set_session(Role::Admin, login.token.as_deref());
            tracing::info!(username, "admin credential login accepted");
            ok(
                &req.id,
                json!({
                    "role": Role::Admin,
                    "redirectTo": DASHBOARD_REDIRECT,
                    "profile": profile_json(state),
                }),
            )
        }
        Err(e) => api_failure(&req.id, &e, "Unable to login right now. Please retry."),
    }
}

/// Exchanges an identity-provider credential for a backend session. The
/// provider gate must have initialized first; `requireAdmin` restricts the
/// admin-only entry point.
fn handle_google(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(id_token) = param_str(req, "idToken").filter(|t| !t.trim().is_empty()) else {
        return err(&req.id, "bad_params", "missing params.idToken", None);
    };
    if !state.identity.is_initialized() {
        return err(
            &req.id,
            "identity_unavailable",
            "Google Sign-In is not available. Please use username/password login.",
            None,
        );
    }

    match state.api.verify_google(id_token) {
        Ok(login) => {
            let role = login
                .role
                .as_deref()
                .map(Role::parse)
                .unwrap_or_default();
            if param_bool(req, "requireAdmin") && role != Role::Admin {
                return err(
                    &req.id,
                    "admin_only",
                    "This is an admin-only login page. Please use the regular login for other roles.",
                    None,
                );
            }
            state.session.set_session(role, login.token.as_deref());
            ok(
                &req.id,
                json!({
                    "role": role,
                    "redirectTo": DASHBOARD_REDIRECT,
                    "profile": profile_json(state),
                }),
            )
        }
        Err(e) => api_failure(&req.id, &e, "Unable to verify Google token. Please try again."),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.session.clear();
    ok(
        &req.id,
        json!({ "role": Role::default(), "redirectTo": crate::api::LOGIN_REDIRECT }),
    )
}

fn handle_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let authenticated = state.session.is_authenticated();
    ok(
        &req.id,
        json!({
            "role": state.session.role(),
            "authenticated": authenticated,
            "profile": profile_json(state),
        }),
    )
}

/// Admin assigns a role to an account, addressed by email or provider
/// subject id.
fn handle_role_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(refusal) = require_role(req, state.session.role(), &[Role::Admin]) {
        return refusal;
    }
    let email = param_str(req, "email").map(str::trim).filter(|s| !s.is_empty());
    let google_sub = param_str(req, "googleSub")
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if email.is_none() && google_sub.is_none() {
        return err(
            &req.id,
            "bad_params",
            "either params.email or params.googleSub is required",
            None,
        );
    }
    let Some(role) = param_str(req, "role") else {
        return err(&req.id, "bad_params", "missing params.role", None);
    };
    if !matches!(role, "ADMIN" | "TEACHER" | "STUDENT") {
        return err(&req.id, "bad_params", format!("unknown role: {role}"), None);
    }

    let payload = RoleUpdateRequest {
        email: email.map(str::to_string),
        google_sub: google_sub.map(str::to_string),
        role: role.to_string(),
    };
    match state.api.update_role(&payload) {
        Ok(updated) => ok(
            &req.id,
            json!({
                "email": updated.email,
                "googleSub": updated.google_sub,
                "name": updated.name,
                "role": updated.role,
            }),
        ),
        Err(e) => api_failure(&req.id, &e, "Unable to update the user's role."),
    }
}

/// Resolves the identity-provider readiness gate. The probe hits the
/// provider script endpoint; success is memoized so calling this again is a
/// cheap no-op.
fn handle_identity_init(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.identity.is_initialized() {
        return ok(
            &req.id,
            json!({
                "initialized": true,
                "clientId": state.identity.client_id(),
            }),
        );
    }
    let probe_url = param_str(req, "probeUrl")
        .unwrap_or("https://accounts.google.com/gsi/client")
        .to_string();

    // Each probe gets one delay's worth of wall clock, so the gate as a
    // whole stays inside its fixed attempt budget even against a hanging
    // endpoint.
    let http = match reqwest::blocking::Client::builder()
        .timeout(PROBE_DELAY)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            return err(
                &req.id,
                "identity_unavailable",
                format!("probe client setup failed: {e}"),
                None,
            )
        }
    };
    let result = state.identity.ensure_ready(|| {
        http.get(&probe_url)
            .send()
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    });

    match result {
        Ok(()) => ok(
            &req.id,
            json!({
                "initialized": true,
                "clientId": state.identity.client_id(),
            }),
        ),
        Err(GateError::NotConfigured) => err(
            &req.id,
            "identity_not_configured",
            "Google Sign-In is not configured. Please use username/password login.",
            None,
        ),
        Err(e @ GateError::Exhausted(_)) => {
            err(&req.id, "identity_unavailable", e.to_string(), None)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        "auth.google" => Some(handle_google(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "auth.status" => Some(handle_status(state, req)),
        "auth.role.set" => Some(handle_role_set(state, req)),
        "identity.init" => Some(handle_identity_init(state, req)),
        _ => None,
    }
}
