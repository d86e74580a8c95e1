mod analytics;
mod api;
mod db;
mod export;
mod identity;
mod ipc;
mod marks;
mod session;
mod token;

use std::io::{self, BufRead, Write};

fn main() {
    // stdout carries IPC frames only; diagnostics go to stderr.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("registrard=info")),
        )
        .with_writer(io::stderr)
        .init();

    let base_url = std::env::var("REGISTRARD_BACKEND_URL")
        .unwrap_or_else(|_| api::DEFAULT_BASE_URL.to_string());
    let identity_client_id = std::env::var("GOOGLE_CLIENT_ID").ok();
    let mut state = ipc::AppState::new(base_url, identity_client_id);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            // The frame had no usable id, so the error goes out without one.
            Err(e) => serde_json::json!({
                "ok": false,
                "error": { "code": "bad_json", "message": e.to_string() },
            }),
        };
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
