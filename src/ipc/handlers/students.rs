use serde_json::json;

use crate::api::Student;
use crate::ipc::error::{api_failure, err, ok};
use crate::ipc::helpers::{param_i64, param_str, parse_param, require_role};
use crate::ipc::types::{AppState, Request};
use crate::session::Role;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = param_str(req, "name");
    let branch = param_str(req, "branch");
    match state.api.list_students(name, branch) {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => api_failure(&req.id, &e, "Unable to load students."),
    }
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(student_id) = param_i64(req, "studentId") else {
        return err(&req.id, "bad_params", "missing params.studentId", None);
    };
    match state.api.get_student(student_id) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => api_failure(&req.id, &e, "Unable to load the student."),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student: Student = match parse_param(req, "student") {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match state.api.create_student(&student) {
        Ok(created) => ok(&req.id, json!({ "student": created })),
        Err(e) => api_failure(&req.id, &e, "Unable to create the student."),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(student_id) = param_i64(req, "studentId") else {
        return err(&req.id, "bad_params", "missing params.studentId", None);
    };
    let student: Student = match parse_param(req, "student") {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match state.api.update_student(student_id, &student) {
        Ok(updated) => {
            // Enrollment or naming may have changed; cached rollups for this
            // student are stale now.
            state.subject_cache.remove(&student_id);
            ok(&req.id, json!({ "student": updated }))
        }
        Err(e) => api_failure(&req.id, &e, "Unable to update the student."),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(student_id) = param_i64(req, "studentId") else {
        return err(&req.id, "bad_params", "missing params.studentId", None);
    };
    match state.api.delete_student(student_id) {
        Ok(()) => {
            state.subject_cache.remove(&student_id);
            ok(&req.id, json!({ "deleted": true }))
        }
        Err(e) => api_failure(&req.id, &e, "Unable to delete the student."),
    }
}

fn handle_count(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.api.students_count() {
        Ok(count) => ok(&req.id, json!({ "count": count })),
        Err(e) => api_failure(&req.id, &e, "Unable to fetch overview metrics right now."),
    }
}

/// Bulk roster import from a CSV file on disk. Admin only; the backend does
/// the actual row validation.
fn handle_bulk_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(refusal) = require_role(req, state.session.role(), &[Role::Admin]) {
        return refusal;
    }
    let Some(csv_path) = param_str(req, "csvPath") else {
        return err(&req.id, "bad_params", "missing params.csvPath", None);
    };
    let csv = match std::fs::read_to_string(csv_path) {
        Ok(csv) => csv,
        Err(e) => return err(&req.id, "io_error", format!("cannot read {csv_path}: {e}"), None),
    };
    match state.api.bulk_import_students(csv) {
        Ok(message) => ok(&req.id, json!({ "message": message })),
        Err(e) => api_failure(
            &req.id,
            &e,
            "Bulk upload failed. Please check file format and try again.",
        ),
    }
}

fn handle_progress_report(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(student_id) = param_i64(req, "studentId") else {
        return err(&req.id, "bad_params", "missing params.studentId", None);
    };
    match state.api.progress_report(student_id) {
        Ok(report) => ok(&req.id, json!({ "report": report })),
        Err(e) => api_failure(&req.id, &e, "Unable to load the progress report."),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_list(state, req)),
        "students.get" => Some(handle_get(state, req)),
        "students.create" => Some(handle_create(state, req)),
        "students.update" => Some(handle_update(state, req)),
        "students.delete" => Some(handle_delete(state, req)),
        "students.count" => Some(handle_count(state, req)),
        "students.bulkImport" => Some(handle_bulk_import(state, req)),
        "students.progressReport" => Some(handle_progress_report(state, req)),
        _ => None,
    }
}
