use serde_json::json;

use crate::api::CreateUserRequest;
use crate::ipc::error::{api_failure, err, ok};
use crate::ipc::helpers::{param_i64, param_str, require_role};
use crate::ipc::types::{AppState, Request};
use crate::session::Role;

fn handle_email_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.api.email_status() {
        Ok(emails) => ok(&req.id, json!({ "emails": emails })),
        Err(e) => api_failure(&req.id, &e, "Failed to load email status."),
    }
}

fn handle_email_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.api.clear_email_status() {
        Ok(()) => ok(&req.id, json!({ "cleared": true })),
        Err(e) => api_failure(&req.id, &e, "Unable to clear email status."),
    }
}

fn handle_email_broadcast(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject = param_str(req, "subject").map(str::trim).unwrap_or_default();
    let message = param_str(req, "message").map(str::trim).unwrap_or_default();
    if subject.is_empty() || message.is_empty() {
        return err(&req.id, "bad_params", "Subject and message are required.", None);
    }
    match state.api.send_broadcast_email(subject, message) {
        Ok(resp) => ok(
            &req.id,
            json!({ "recipients": resp.recipients, "subject": resp.subject }),
        ),
        Err(e) => api_failure(&req.id, &e, "Unable to send broadcast email."),
    }
}

fn handle_email_individual(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(student_id) = param_i64(req, "studentId") else {
        return err(&req.id, "bad_params", "Select a valid student.", None);
    };
    let subject = param_str(req, "subject").map(str::trim).unwrap_or_default();
    let message = param_str(req, "message").map(str::trim).unwrap_or_default();
    if subject.is_empty() || message.is_empty() {
        return err(&req.id, "bad_params", "Subject and message are required.", None);
    }
    match state.api.send_student_email(student_id, subject, message) {
        Ok(resp) => ok(
            &req.id,
            json!({
                "studentId": resp.student_id,
                "studentName": resp.student_name,
                "email": resp.email,
                "subject": resp.subject,
            }),
        ),
        Err(e) => api_failure(&req.id, &e, "Unable to send email to student."),
    }
}

fn handle_email_queue(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.api.email_queue() {
        Ok(queue) => ok(&req.id, json!({ "queue": queue })),
        Err(e) => api_failure(&req.id, &e, "Unable to load the email queue."),
    }
}

fn handle_email_queue_process(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.api.process_email_queue() {
        Ok(()) => ok(&req.id, json!({ "triggered": true })),
        Err(e) => api_failure(&req.id, &e, "Unable to process the email queue."),
    }
}

fn handle_notifications_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.api.in_app_notifications() {
        Ok(notifications) => {
            let unread = notifications
                .iter()
                .filter(|n| n.status == "UNREAD")
                .count();
            ok(
                &req.id,
                json!({ "notifications": notifications, "unread": unread }),
            )
        }
        Err(e) => api_failure(&req.id, &e, "Failed to load notifications."),
    }
}

fn handle_notifications_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.api.clear_in_app_notifications() {
        Ok(()) => ok(&req.id, json!({ "cleared": true })),
        Err(e) => api_failure(&req.id, &e, "Unable to clear notifications."),
    }
}

fn handle_notifications_mark_read(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(id) = param_i64(req, "id") else {
        return err(&req.id, "bad_params", "missing params.id", None);
    };
    match state.api.mark_notification_read(id) {
        Ok(updated) => ok(&req.id, json!({ "notification": updated })),
        Err(e) => api_failure(&req.id, &e, "Unable to mark notification as read."),
    }
}

/// Creates a staff account (ADMIN or TEACHER). Students are enrolled
/// through the roster screens, not here.
fn handle_users_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let email = param_str(req, "email").map(str::trim).unwrap_or_default();
    if email.is_empty() {
        return err(&req.id, "bad_params", "Email is required", None);
    }
    let Some(password) = param_str(req, "password").filter(|p| p.len() >= 6) else {
        return err(
            &req.id,
            "bad_params",
            "Password must be at least 6 characters long",
            None,
        );
    };
    let Some(role) = param_str(req, "role").filter(|r| matches!(*r, "ADMIN" | "TEACHER")) else {
        return err(&req.id, "bad_params", "Role is required", None);
    };
    let full_name = param_str(req, "fullName")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let payload = CreateUserRequest {
        email: email.to_string(),
        password: password.to_string(),
        role: role.to_string(),
        full_name,
    };
    match state.api.create_user(&payload) {
        Ok(created) => ok(
            &req.id,
            json!({
                "email": created.email,
                "role": created.role,
                "fullName": created.full_name,
            }),
        ),
        Err(e) => api_failure(&req.id, &e, "Failed to create user"),
    }
}

fn handle_teachers_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let email = param_str(req, "email").map(str::trim).unwrap_or_default();
    if email.is_empty() {
        return err(
            &req.id,
            "bad_params",
            "Email is required to delete a teacher.",
            None,
        );
    }
    match state.api.delete_teacher(email) {
        Ok(()) => ok(&req.id, json!({ "deleted": true, "email": email })),
        Err(e) => api_failure(&req.id, &e, "Failed to delete teacher"),
    }
}

fn handle_reports_daily(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.api.daily_reports() {
        Ok(reports) => ok(&req.id, json!({ "reports": reports })),
        Err(e) => api_failure(&req.id, &e, "Unable to load daily reports."),
    }
}

fn handle_schedule_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.api.report_schedule() {
        Ok(schedule) => ok(&req.id, json!({ "schedule": schedule })),
        Err(e) => api_failure(&req.id, &e, "Unable to load the report schedule."),
    }
}

fn handle_schedule_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(hour), Some(minute)) = (param_i64(req, "hour"), param_i64(req, "minute")) else {
        return err(
            &req.id,
            "bad_params",
            "missing params.hour or params.minute",
            None,
        );
    };
    if !(0..24).contains(&hour) || !(0..60).contains(&minute) {
        return err(&req.id, "bad_params", "hour/minute out of range", None);
    }
    match state.api.update_report_schedule(hour as u32, minute as u32) {
        Ok(schedule) => ok(&req.id, json!({ "schedule": schedule })),
        Err(e) => api_failure(&req.id, &e, "Unable to update the report schedule."),
    }
}

fn handle_daily_trigger(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.api.trigger_daily_report() {
        Ok(message) => ok(&req.id, json!({ "message": message })),
        Err(e) => api_failure(&req.id, &e, "Unable to trigger the daily report."),
    }
}

fn handle_progress_trigger(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.api.trigger_progress_analytics_report() {
        Ok(message) => ok(&req.id, json!({ "message": message })),
        Err(e) => api_failure(&req.id, &e, "Unable to trigger the analytics report."),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    if !req.method.starts_with("admin.") {
        return None;
    }
    // Every admin screen is role-gated in the UI and again by the backend.
    if let Some(refusal) = require_role(req, state.session.role(), &[Role::Admin]) {
        return Some(refusal);
    }
    match req.method.as_str() {
        "admin.email.status" => Some(handle_email_status(state, req)),
        "admin.email.clear" => Some(handle_email_clear(state, req)),
        "admin.email.broadcast" => Some(handle_email_broadcast(state, req)),
        "admin.email.individual" => Some(handle_email_individual(state, req)),
        "admin.email.queue" => Some(handle_email_queue(state, req)),
        "admin.email.queue.process" => Some(handle_email_queue_process(state, req)),
        "admin.notifications.list" => Some(handle_notifications_list(state, req)),
        "admin.notifications.clear" => Some(handle_notifications_clear(state, req)),
        "admin.notifications.markRead" => Some(handle_notifications_mark_read(state, req)),
        "admin.users.create" => Some(handle_users_create(state, req)),
        "admin.teachers.delete" => Some(handle_teachers_delete(state, req)),
        "admin.reports.daily" => Some(handle_reports_daily(state, req)),
        "admin.reports.schedule.get" => Some(handle_schedule_get(state, req)),
        "admin.reports.schedule.set" => Some(handle_schedule_set(state, req)),
        "admin.reports.daily.trigger" => Some(handle_daily_trigger(state, req)),
        "admin.reports.progress.trigger" => Some(handle_progress_trigger(state, req)),
        _ => None,
    }
}
