
use serde_json::json;
use test_support::{
    expired_jwt, future_jwt, request_err, request_ok, spawn_sidecar, temp_dir, StubBackend,
    StubRoute,
};

fn configure(
    stdin: &mut std::process::ChildStdin,
    reader: &mut std::io::BufReader<std::process::ChildStdout>,
    backend: &StubBackend,
) {
    let _ = request_ok(
        stdin,
        reader,
        "cfg",
        "backend.configure",
        json!({ "baseUrl": backend.base_url() }),
    );
}

#[test]
fn admin_login_establishes_session_and_logout_tears_it_down() {
    let backend = StubBackend::start(vec![StubRoute::json(
        "POST",
        "/api/auth/admin/login",
        json!({
            "role": "ADMIN",
            "token": future_jwt("Priya Sharma"),
            "name": "Priya Sharma",
            "email": "priya@example.edu"
        }),
    )]);
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    configure(&mut stdin, &mut reader, &backend);

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "username": "admin", "password": "secret" }),
    );
    assert_eq!(login.get("role").and_then(|v| v.as_str()), Some("ADMIN"));
    assert_eq!(
        login.get("redirectTo").and_then(|v| v.as_str()),
        Some("/overview")
    );
    assert_eq!(
        login
            .pointer("/profile/name")
            .and_then(|v| v.as_str()),
        Some("Priya Sharma")
    );

    let status = request_ok(&mut stdin, &mut reader, "2", "auth.status", json!({}));
    assert_eq!(
        status.get("authenticated").and_then(|v| v.as_bool()),
        Some(true)
    );
    assert_eq!(status.get("role").and_then(|v| v.as_str()), Some("ADMIN"));

    let out = request_ok(&mut stdin, &mut reader, "3", "auth.logout", json!({}));
    assert_eq!(out.get("redirectTo").and_then(|v| v.as_str()), Some("/"));

    let status = request_ok(&mut stdin, &mut reader, "4", "auth.status", json!({}));
    assert_eq!(
        status.get("authenticated").and_then(|v| v.as_bool()),
        Some(false)
    );
    assert_eq!(status.get("role").and_then(|v| v.as_str()), Some("STUDENT"));
}

#[test]
fn non_admin_account_cannot_use_the_admin_login() {
    let backend = StubBackend::start(vec![StubRoute::json(
        "POST",
        "/api/auth/admin/login",
        json!({ "role": "TEACHER", "token": future_jwt("Sam") }),
    )]);
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    configure(&mut stdin, &mut reader, &backend);

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "username": "sam", "password": "secret" }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("admin_only"));

    let status = request_ok(&mut stdin, &mut reader, "2", "auth.status", json!({}));
    assert_eq!(
        status.get("authenticated").and_then(|v| v.as_bool()),
        Some(false)
    );
}

#[test]
fn backend_failure_message_reaches_the_caller() {
    let backend = StubBackend::start(vec![StubRoute::status(
        "POST",
        "/api/auth/admin/login",
        500,
        r#"{"message":"Database is down for maintenance"}"#,
    )]);
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    configure(&mut stdin, &mut reader, &backend);

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "username": "admin", "password": "secret" }),
    );
    assert_eq!(
        error.get("code").and_then(|v| v.as_str()),
        Some("backend_error")
    );
    assert_eq!(
        error.get("message").and_then(|v| v.as_str()),
        Some("Database is down for maintenance")
    );
    assert_eq!(error.pointer("/details/status").and_then(|v| v.as_i64()), Some(500));
}

#[test]
fn rejected_credential_clears_the_session_and_points_at_login() {
    let backend = StubBackend::start(vec![
        StubRoute::json(
            "POST",
            "/api/auth/admin/login",
            json!({ "role": "ADMIN", "token": future_jwt("Priya") }),
        ),
        StubRoute::status("GET", "/students", 401, ""),
    ]);
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    configure(&mut stdin, &mut reader, &backend);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "username": "admin", "password": "secret" }),
    );

    let error = request_err(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(
        error.get("code").and_then(|v| v.as_str()),
        Some("unauthorized")
    );
    assert_eq!(
        error.pointer("/details/redirectTo").and_then(|v| v.as_str()),
        Some("/")
    );

    let status = request_ok(&mut stdin, &mut reader, "3", "auth.status", json!({}));
    assert_eq!(
        status.get("authenticated").and_then(|v| v.as_bool()),
        Some(false)
    );
    assert_eq!(status.get("role").and_then(|v| v.as_str()), Some("STUDENT"));
}

#[test]
fn expired_token_never_counts_as_authenticated() {
    let backend = StubBackend::start(vec![StubRoute::json(
        "POST",
        "/api/auth/admin/login",
        json!({ "role": "ADMIN", "token": expired_jwt("Priya") }),
    )]);
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    configure(&mut stdin, &mut reader, &backend);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "username": "admin", "password": "secret" }),
    );

    let status = request_ok(&mut stdin, &mut reader, "2", "auth.status", json!({}));
    assert_eq!(
        status.get("authenticated").and_then(|v| v.as_bool()),
        Some(false)
    );
}

#[test]
fn session_survives_a_restart_through_the_workspace_store() {
    let workspace = temp_dir("registrar-session-restart");
    let backend = StubBackend::start(vec![StubRoute::json(
        "POST",
        "/api/auth/admin/login",
        json!({ "role": "ADMIN", "token": future_jwt("Priya") }),
    )]);

    {
        let (_child, mut stdin, mut reader) = spawn_sidecar();
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        configure(&mut stdin, &mut reader, &backend);
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "auth.login",
            json!({ "username": "admin", "password": "secret" }),
        );
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let restored = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(restored.get("role").and_then(|v| v.as_str()), Some("ADMIN"));
    assert_eq!(
        restored.get("authenticated").and_then(|v| v.as_bool()),
        Some(true)
    );
}
