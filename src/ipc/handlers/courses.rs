use serde_json::json;

use crate::api::Course;
use crate::ipc::error::{api_failure, err, ok};
use crate::ipc::helpers::{param_i64, param_str, parse_param};
use crate::ipc::types::{AppState, Request};

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = param_str(req, "name");
    let code = param_str(req, "code");
    match state.api.list_courses(name, code) {
        Ok(courses) => ok(&req.id, json!({ "courses": courses })),
        Err(e) => api_failure(&req.id, &e, "Unable to load courses."),
    }
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(course_id) = param_i64(req, "courseId") else {
        return err(&req.id, "bad_params", "missing params.courseId", None);
    };
    match state.api.get_course(course_id) {
        Ok(course) => ok(&req.id, json!({ "course": course })),
        Err(e) => api_failure(&req.id, &e, "Unable to load the course."),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let course: Course = match parse_param(req, "course") {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match state.api.create_course(&course) {
        Ok(created) => ok(&req.id, json!({ "course": created })),
        Err(e) => api_failure(&req.id, &e, "Unable to create the course."),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(course_id) = param_i64(req, "courseId") else {
        return err(&req.id, "bad_params", "missing params.courseId", None);
    };
    let course: Course = match parse_param(req, "course") {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match state.api.update_course(course_id, &course) {
        Ok(updated) => ok(&req.id, json!({ "course": updated })),
        Err(e) => api_failure(&req.id, &e, "Unable to update the course."),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(course_id) = param_i64(req, "courseId") else {
        return err(&req.id, "bad_params", "missing params.courseId", None);
    };
    match state.api.delete_course(course_id) {
        Ok(()) => ok(&req.id, json!({ "deleted": true })),
        Err(e) => api_failure(&req.id, &e, "Unable to delete the course."),
    }
}

fn handle_count(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.api.courses_count() {
        Ok(count) => ok(&req.id, json!({ "count": count })),
        Err(e) => api_failure(&req.id, &e, "Unable to fetch overview metrics right now."),
    }
}

fn handle_enroll(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(course_id), Some(student_id)) =
        (param_i64(req, "courseId"), param_i64(req, "studentId"))
    else {
        return err(
            &req.id,
            "bad_params",
            "missing params.courseId or params.studentId",
            None,
        );
    };
    match state.api.enroll_student(course_id, student_id) {
        Ok(course) => {
            state.subject_cache.remove(&student_id);
            ok(&req.id, json!({ "course": course }))
        }
        Err(e) => api_failure(&req.id, &e, "Unable to enroll the student."),
    }
}

fn handle_unenroll(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(course_id), Some(student_id)) =
        (param_i64(req, "courseId"), param_i64(req, "studentId"))
    else {
        return err(
            &req.id,
            "bad_params",
            "missing params.courseId or params.studentId",
            None,
        );
    };
    match state.api.unenroll_student(course_id, student_id) {
        Ok(course) => {
            state.subject_cache.remove(&student_id);
            ok(&req.id, json!({ "course": course }))
        }
        Err(e) => api_failure(&req.id, &e, "Unable to remove the student from the course."),
    }
}

fn handle_for_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(student_id) = param_i64(req, "studentId") else {
        return err(&req.id, "bad_params", "missing params.studentId", None);
    };
    match state.api.courses_for_student(student_id) {
        Ok(courses) => ok(&req.id, json!({ "courses": courses })),
        Err(e) => api_failure(&req.id, &e, "Unable to load the student's courses."),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.list" => Some(handle_list(state, req)),
        "courses.get" => Some(handle_get(state, req)),
        "courses.create" => Some(handle_create(state, req)),
        "courses.update" => Some(handle_update(state, req)),
        "courses.delete" => Some(handle_delete(state, req)),
        "courses.count" => Some(handle_count(state, req)),
        "courses.enroll" => Some(handle_enroll(state, req)),
        "courses.unenroll" => Some(handle_unenroll(state, req)),
        "courses.forStudent" => Some(handle_for_student(state, req)),
        _ => None,
    }
}
