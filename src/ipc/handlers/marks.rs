use serde_json::json;

use crate::api::StudentMark;
use crate::ipc::error::{api_failure, err, ok};
use crate::ipc::helpers::{param_bool, param_i64, parse_param};
use crate::ipc::types::{AppState, Request};
use crate::marks;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(student_id) = param_i64(req, "studentId") else {
        return err(&req.id, "bad_params", "missing params.studentId", None);
    };
    match state.api.list_marks(student_id) {
        Ok(marks) => ok(&req.id, json!({ "marks": marks })),
        Err(e) => api_failure(&req.id, &e, "Unable to load marks."),
    }
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(student_id) = param_i64(req, "studentId") else {
        return err(&req.id, "bad_params", "missing params.studentId", None);
    };
    let mark: StudentMark = match parse_param(req, "mark") {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    match state.api.add_mark(student_id, &mark) {
        Ok(created) => {
            state.subject_cache.remove(&student_id);
            ok(&req.id, json!({ "mark": created }))
        }
        Err(e) => api_failure(&req.id, &e, "Unable to record the mark."),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(student_id), Some(mark_id)) =
        (param_i64(req, "studentId"), param_i64(req, "markId"))
    else {
        return err(
            &req.id,
            "bad_params",
            "missing params.studentId or params.markId",
            None,
        );
    };
    let mark: StudentMark = match parse_param(req, "mark") {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    match state.api.update_mark(student_id, mark_id, &mark) {
        Ok(updated) => {
            state.subject_cache.remove(&student_id);
            ok(&req.id, json!({ "mark": updated }))
        }
        Err(e) => api_failure(&req.id, &e, "Unable to update the mark."),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(student_id), Some(mark_id)) =
        (param_i64(req, "studentId"), param_i64(req, "markId"))
    else {
        return err(
            &req.id,
            "bad_params",
            "missing params.studentId or params.markId",
            None,
        );
    };
    match state.api.delete_mark(student_id, mark_id) {
        Ok(()) => {
            state.subject_cache.remove(&student_id);
            ok(&req.id, json!({ "deleted": true }))
        }
        Err(e) => api_failure(&req.id, &e, "Unable to delete the mark."),
    }
}

/// Marks card plus its chart view: one bar per scorable mark on a fixed
/// percent axis.
fn handle_card(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(student_id) = param_i64(req, "studentId") else {
        return err(&req.id, "bad_params", "missing params.studentId", None);
    };
    match state.api.marks_card(student_id) {
        Ok(card) => {
            let chart = marks::card_chart_rows(&card.marks);
            ok(
                &req.id,
                json!({
                    "studentId": card.student_id,
                    "studentName": card.student_name,
                    "percentage": card.percentage,
                    "marks": card.marks,
                    "chart": chart,
                    "percentAxisTicks": marks::CARD_PERCENT_TICKS,
                }),
            )
        }
        Err(e) => api_failure(&req.id, &e, "Unable to load marks card."),
    }
}

/// Composite load: the student record and the mark list are fetched
/// together and the rollup only happens when both legs succeed; a failure
/// on either side is reported once for the whole operation.
fn handle_subjects(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(student_id) = param_i64(req, "studentId") else {
        return err(&req.id, "bad_params", "missing params.studentId", None);
    };
    if param_bool(req, "refresh") {
        state.subject_cache.remove(&student_id);
    }
    if let Some(cached) = state.subject_cache.get(&student_id) {
        return ok(
            &req.id,
            json!({ "studentId": student_id, "subjects": cached, "cached": true }),
        );
    }

    let fallback = "Unable to load subject breakdown.";
    let student = match state.api.get_student(student_id) {
        Ok(s) => s,
        Err(e) => return api_failure(&req.id, &e, fallback),
    };
    let mark_list = match state.api.list_marks(student_id) {
        Ok(m) => m,
        Err(e) => return api_failure(&req.id, &e, fallback),
    };

    let subjects = marks::aggregate_marks_by_subject(&student, &mark_list);
    state.subject_cache.insert(student_id, subjects.clone());
    ok(
        &req.id,
        json!({ "studentId": student_id, "subjects": subjects, "cached": false }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "marks.list" => Some(handle_list(state, req)),
        "marks.add" => Some(handle_add(state, req)),
        "marks.update" => Some(handle_update(state, req)),
        "marks.delete" => Some(handle_delete(state, req)),
        "marks.card" => Some(handle_card(state, req)),
        "marks.subjects" => Some(handle_subjects(state, req)),
        _ => None,
    }
}
