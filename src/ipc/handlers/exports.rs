use serde_json::json;
use std::path::PathBuf;

use crate::export;
use crate::ipc::error::{api_failure, err, ok};
use crate::ipc::helpers::param_str;
use crate::ipc::types::{AppState, Request};

fn out_path(req: &Request) -> Result<PathBuf, serde_json::Value> {
    param_str(req, "outPath")
        .map(PathBuf::from)
        .ok_or_else(|| err(&req.id, "bad_params", "missing params.outPath", None))
}

fn handle_students_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match out_path(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let name = param_str(req, "name");
    let branch = param_str(req, "branch");
    let students = match state.api.list_students(name, branch) {
        Ok(s) => s,
        Err(e) => return api_failure(&req.id, &e, "Unable to load students."),
    };
    let csv = export::students_csv(&students);
    match export::write_text_file(&path, &csv) {
        Ok(()) => ok(
            &req.id,
            json!({ "outPath": path.to_string_lossy(), "rows": students.len() }),
        ),
        Err(e) => err(&req.id, "io_error", format!("{e:?}"), None),
    }
}

fn handle_performance_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match out_path(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let rows = match state.api.performance_summary() {
        Ok(r) => r,
        Err(e) => return api_failure(&req.id, &e, "Unable to load performance summary."),
    };
    let csv = export::performance_csv(&rows);
    match export::write_text_file(&path, &csv) {
        Ok(()) => ok(
            &req.id,
            json!({ "outPath": path.to_string_lossy(), "rows": rows.len() }),
        ),
        Err(e) => err(&req.id, "io_error", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "export.students.csv" => Some(handle_students_csv(state, req)),
        "export.performance.csv" => Some(handle_performance_csv(state, req)),
        _ => None,
    }
}
