
use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn health_reports_defaults_before_any_session() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(
        health.get("version").and_then(|v| v.as_str()),
        Some(env!("CARGO_PKG_VERSION"))
    );
    assert_eq!(health.get("role").and_then(|v| v.as_str()), Some("STUDENT"));
    assert_eq!(
        health.get("authenticated").and_then(|v| v.as_bool()),
        Some(false)
    );
    assert!(health.get("workspacePath").map(|v| v.is_null()).unwrap_or(false));
}

#[test]
fn backend_configure_updates_health() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let configured = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "backend.configure",
        json!({ "baseUrl": "http://127.0.0.1:9999" }),
    );
    assert_eq!(
        configured.get("backendUrl").and_then(|v| v.as_str()),
        Some("http://127.0.0.1:9999")
    );

    let health = request_ok(&mut stdin, &mut reader, "2", "health", json!({}));
    assert_eq!(
        health.get("backendUrl").and_then(|v| v.as_str()),
        Some("http://127.0.0.1:9999")
    );

    let error = request_err(&mut stdin, &mut reader, "3", "backend.configure", json!({}));
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("bad_params"));
}

#[test]
fn workspace_select_persists_and_reports_path() {
    let workspace = temp_dir("registrar-smoke-workspace");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(
        selected.get("workspacePath").and_then(|v| v.as_str()),
        Some(workspace.to_string_lossy().as_ref())
    );
    assert_eq!(
        selected.get("authenticated").and_then(|v| v.as_bool()),
        Some(false)
    );
    assert!(workspace.join("registrar.sqlite3").exists());
}

#[test]
fn unknown_method_is_rejected() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let error = request_err(&mut stdin, &mut reader, "1", "no.such.method", json!({}));
    assert_eq!(
        error.get("code").and_then(|v| v.as_str()),
        Some("not_implemented")
    );
}

#[test]
fn admin_methods_are_refused_without_the_admin_role() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let error = request_err(&mut stdin, &mut reader, "1", "admin.email.status", json!({}));
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("forbidden"));

    let error = request_err(&mut stdin, &mut reader, "2", "analytics.summary", json!({}));
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("forbidden"));
}

#[test]
fn login_requires_both_credentials() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "username": "admin", "password": "   " }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("bad_params"));
    assert_eq!(
        error.get("message").and_then(|v| v.as_str()),
        Some("Please enter both username and password.")
    );
}
