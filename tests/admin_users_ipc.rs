
use serde_json::json;
use test_support::{future_jwt, request_err, request_ok, spawn_sidecar, StubBackend, StubRoute};

fn stub_admin_backend() -> StubBackend {
    StubBackend::start(vec![
        StubRoute::json(
            "POST",
            "/api/auth/admin/login",
            json!({ "role": "ADMIN", "token": future_jwt("Admin") }),
        ),
        StubRoute::json(
            "POST",
            "/api/auth/admin/users",
            json!({ "email": "grace@example.edu", "role": "TEACHER", "fullName": "Grace Lin" }),
        ),
        // The email lands percent-encoded in the path segment.
        StubRoute::json("DELETE", "/api/admin/teachers/grace%40example.edu", json!({})),
    ])
}

fn login_as_admin(
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
    let _ = request_ok(
        stdin,
        reader,
        "login",
        "auth.login",
        json!({ "username": "admin", "password": "secret" }),
    );
}

#[test]
fn admin_creates_a_staff_account() {
    let backend = stub_admin_backend();
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    login_as_admin(&mut stdin, &mut reader, &backend);

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "admin.users.create",
        json!({
            "email": "grace@example.edu",
            "password": "s3cret!",
            "role": "TEACHER",
            "fullName": "Grace Lin"
        }),
    );
    assert_eq!(
        created.get("email").and_then(|v| v.as_str()),
        Some("grace@example.edu")
    );
    assert_eq!(created.get("role").and_then(|v| v.as_str()), Some("TEACHER"));
}

#[test]
fn user_creation_validates_its_form_fields() {
    let backend = stub_admin_backend();
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    login_as_admin(&mut stdin, &mut reader, &backend);

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "admin.users.create",
        json!({ "email": "   ", "password": "s3cret!", "role": "TEACHER" }),
    );
    assert_eq!(
        error.get("message").and_then(|v| v.as_str()),
        Some("Email is required")
    );

    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "admin.users.create",
        json!({ "email": "grace@example.edu", "password": "short", "role": "TEACHER" }),
    );
    assert_eq!(
        error.get("message").and_then(|v| v.as_str()),
        Some("Password must be at least 6 characters long")
    );

    let error = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "admin.users.create",
        json!({ "email": "grace@example.edu", "password": "s3cret!", "role": "STUDENT" }),
    );
    assert_eq!(
        error.get("message").and_then(|v| v.as_str()),
        Some("Role is required")
    );
}

#[test]
fn admin_deletes_a_teacher_by_email() {
    let backend = stub_admin_backend();
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    login_as_admin(&mut stdin, &mut reader, &backend);

    // The stub only answers the percent-encoded path, so success here
    // proves the address was encoded on the way out.
    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "admin.teachers.delete",
        json!({ "email": "grace@example.edu" }),
    );
    assert_eq!(deleted.get("deleted").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(
        deleted.get("email").and_then(|v| v.as_str()),
        Some("grace@example.edu")
    );

    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "admin.teachers.delete",
        json!({ "email": "  " }),
    );
    assert_eq!(
        error.get("message").and_then(|v| v.as_str()),
        Some("Email is required to delete a teacher.")
    );
}

#[test]
fn user_management_is_admin_gated() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "admin.users.create",
        json!({ "email": "grace@example.edu", "password": "s3cret!", "role": "TEACHER" }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("forbidden"));

    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "admin.teachers.delete",
        json!({ "email": "grace@example.edu" }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("forbidden"));
    assert_eq!(
        error.get("message").and_then(|v| v.as_str()),
        Some("ADMIN role required")
    );
}

#[test]
fn backend_rejection_surfaces_its_message() {
    let backend = StubBackend::start(vec![
        StubRoute::json(
            "POST",
            "/api/auth/admin/login",
            json!({ "role": "ADMIN", "token": future_jwt("Admin") }),
        ),
        StubRoute::status(
            "POST",
            "/api/auth/admin/users",
            409,
            r#"{"message":"User already exists"}"#,
        ),
    ]);
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    login_as_admin(&mut stdin, &mut reader, &backend);

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "admin.users.create",
        json!({ "email": "grace@example.edu", "password": "s3cret!", "role": "TEACHER" }),
    );
    assert_eq!(
        error.get("code").and_then(|v| v.as_str()),
        Some("backend_error")
    );
    assert_eq!(
        error.get("message").and_then(|v| v.as_str()),
        Some("User already exists")
    );
}
