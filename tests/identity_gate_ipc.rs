
use serde_json::json;
use test_support::{
    future_jwt, request_err, request_ok, spawn_sidecar, spawn_sidecar_with_env, StubBackend,
    StubRoute,
};

#[test]
fn init_without_a_client_id_reports_not_configured() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let error = request_err(&mut stdin, &mut reader, "1", "identity.init", json!({}));
    assert_eq!(
        error.get("code").and_then(|v| v.as_str()),
        Some("identity_not_configured")
    );

    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "auth.google",
        json!({ "idToken": "provider-credential" }),
    );
    assert_eq!(
        error.get("code").and_then(|v| v.as_str()),
        Some("identity_unavailable")
    );
}

#[test]
fn placeholder_client_id_counts_as_unconfigured() {
    let (_child, mut stdin, mut reader) = spawn_sidecar_with_env(&[(
        "GOOGLE_CLIENT_ID",
        "YOUR_GOOGLE_CLIENT_ID.apps.googleusercontent.com",
    )]);

    let error = request_err(&mut stdin, &mut reader, "1", "identity.init", json!({}));
    assert_eq!(
        error.get("code").and_then(|v| v.as_str()),
        Some("identity_not_configured")
    );
}

#[test]
fn init_succeeds_once_the_provider_script_answers() {
    let provider = StubBackend::start(vec![StubRoute::status("GET", "/gsi/client", 200, "ok")]);
    let (_child, mut stdin, mut reader) = spawn_sidecar_with_env(&[(
        "GOOGLE_CLIENT_ID",
        "1234567890.apps.googleusercontent.com",
    )]);

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "identity.init",
        json!({ "probeUrl": provider.url("/gsi/client") }),
    );
    assert_eq!(first.get("initialized").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(
        first.get("clientId").and_then(|v| v.as_str()),
        Some("1234567890.apps.googleusercontent.com")
    );

    // Readiness is memoized; a second init does not probe again.
    let second = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "identity.init",
        json!({ "probeUrl": "http://127.0.0.1:1/unreachable" }),
    );
    assert_eq!(second.get("initialized").and_then(|v| v.as_bool()), Some(true));
}

#[test]
fn unreachable_probe_endpoint_exhausts_within_the_fixed_budget() {
    let (_child, mut stdin, mut reader) = spawn_sidecar_with_env(&[(
        "GOOGLE_CLIENT_ID",
        "1234567890.apps.googleusercontent.com",
    )]);

    let started = std::time::Instant::now();
    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "identity.init",
        json!({ "probeUrl": "http://127.0.0.1:1/gsi/client" }),
    );
    assert_eq!(
        error.get("code").and_then(|v| v.as_str()),
        Some("identity_unavailable")
    );
    assert!(
        error
            .get("message")
            .and_then(|v| v.as_str())
            .map(|m| m.contains("50 attempts"))
            .unwrap_or(false),
        "message should report the exhausted attempt budget: {error}"
    );
    // 50 probes, each bounded by one probe-delay timeout plus one delay of
    // sleep. Leave generous slack for slow CI.
    assert!(
        started.elapsed() < std::time::Duration::from_secs(30),
        "gate must give up within its bounded budget"
    );
}

#[test]
fn google_login_flows_through_an_initialized_gate() {
    let provider = StubBackend::start(vec![StubRoute::status("GET", "/gsi/client", 200, "ok")]);
    let backend = StubBackend::start(vec![StubRoute::json(
        "POST",
        "/api/auth/google",
        json!({ "role": "TEACHER", "token": future_jwt("Grace Lin") }),
    )]);
    let (_child, mut stdin, mut reader) = spawn_sidecar_with_env(&[(
        "GOOGLE_CLIENT_ID",
        "1234567890.apps.googleusercontent.com",
    )]);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "backend.configure",
        json!({ "baseUrl": backend.base_url() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "identity.init",
        json!({ "probeUrl": provider.url("/gsi/client") }),
    );

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "auth.google",
        json!({ "idToken": "provider-credential" }),
    );
    assert_eq!(login.get("role").and_then(|v| v.as_str()), Some("TEACHER"));
    assert_eq!(
        login.get("redirectTo").and_then(|v| v.as_str()),
        Some("/overview")
    );

    // The admin-only entry point refuses a teacher account.
    let error = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "auth.google",
        json!({ "idToken": "provider-credential", "requireAdmin": true }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("admin_only"));

    let status = request_ok(&mut stdin, &mut reader, "5", "auth.status", json!({}));
    assert_eq!(status.get("role").and_then(|v| v.as_str()), Some("TEACHER"));
    assert_eq!(
        status.get("authenticated").and_then(|v| v.as_bool()),
        Some(true)
    );
}
