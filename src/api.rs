use std::rc::Rc;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::session::SessionStore;

/// Percent-encoding for values embedded in a URL path segment, e.g. an
/// email address addressing an account.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Where the shell should navigate after a forced logout.
pub const LOGIN_REDIRECT: &str = "/";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend rejected the credential. The session has already been
    /// cleared by the time this is returned.
    #[error("authentication required")]
    Unauthorized,
    #[error("backend error (status {status})")]
    Backend { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// User-facing message: backend-supplied text wins, unreachable servers
    /// get a pointed hint, everything else falls back to the caller's
    /// generic message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Unauthorized => {
                "Your session has expired. Please sign in again.".to_string()
            }
            ApiError::Backend { status, message } => {
                if message.is_empty() {
                    format!("{fallback} (status {status})")
                } else {
                    message.clone()
                }
            }
            ApiError::Transport(e) if e.is_connect() || e.is_timeout() => {
                "Cannot reach server. Is the backend running?".to_string()
            }
            ApiError::Transport(_) | ApiError::Decode(_) => fallback.to_string(),
        }
    }
}

/// Pulls a human-readable message out of an error body: a `message` or
/// `error` JSON field when the body is an object, otherwise the trimmed
/// plain-text body itself.
fn extract_backend_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "error"] {
            if let Some(text) = value.get(field).and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
        return String::new();
    }
    body.trim().to_string()
}

// ---------------------------------------------------------------------------
// Wire models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentMark {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessed_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarksCard {
    pub student_id: Option<i64>,
    pub student_name: Option<String>,
    #[serde(default)]
    pub marks: Vec<StudentMark>,
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPerformance {
    pub student_id: Option<i64>,
    pub student_name: Option<String>,
    pub branch: Option<String>,
    pub percentage: Option<f64>,
    pub average_score: Option<f64>,
    pub total_assessments: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub role: Option<String>,
    pub token: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_sub: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdateResponse {
    pub email: Option<String>,
    pub google_sub: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub role: String,
    /// Serialized as an explicit null when absent; the backend accepts both.
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub email: Option<String>,
    pub role: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailNotification {
    pub id: i64,
    pub to_email: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub status: String,
    pub sent_time: Option<String>,
    pub retry_count: Option<i64>,
    pub last_attempt_time: Option<String>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub title: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub status: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReportLog {
    pub id: i64,
    pub report_date: Option<String>,
    pub file_name: Option<String>,
    #[serde(default)]
    pub status: String,
    pub generated_at: Option<String>,
    pub sent_at: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportScheduleConfig {
    pub id: Option<i64>,
    pub report_hour: u32,
    pub report_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastEmailResponse {
    pub recipients: i64,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualEmailResponse {
    pub student_id: Option<i64>,
    pub student_name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking HTTP client for the administration backend. Every request picks
/// up the current bearer token; every 401 clears the shared session before
/// the error is propagated, so concurrent failures can only re-assert the
/// default state.
pub struct BackendClient {
    http: Client,
    base_url: String,
    session: Rc<SessionStore>,
}

impl BackendClient {
    pub fn new(session: Rc<SessionStore>, base_url: impl Into<String>) -> Self {
        BackendClient {
            http: Client::new(),
            base_url: base_url.into(),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send()?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("backend rejected credential (401); session cleared");
            self.session.clear();
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = extract_backend_message(&body);
            tracing::debug!(status = status.as_u16(), %message, "backend error");
            return Err(ApiError::Backend {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    /// Sends and decodes a JSON body. Bodies delivered as `text/plain` that
    /// still parse as JSON are accepted; the role-assignment endpoint
    /// answers that way.
    fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let text = self.send(builder)?.text()?;
        Ok(serde_json::from_str(&text)?)
    }

    fn send_text(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        Ok(self.send(builder)?.text()?)
    }

    fn send_unit(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.send(builder)?;
        Ok(())
    }

    // -- auth ---------------------------------------------------------------

    pub fn login_admin(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.send_json(
            self.request(Method::POST, "/api/auth/admin/login")
                .json(&serde_json::json!({ "username": username, "password": password })),
        )
    }

    pub fn verify_google(&self, id_token: &str) -> Result<LoginResponse, ApiError> {
        self.send_json(
            self.request(Method::POST, "/api/auth/google")
                .json(&serde_json::json!({ "idToken": id_token })),
        )
    }

    pub fn update_role(&self, payload: &RoleUpdateRequest) -> Result<RoleUpdateResponse, ApiError> {
        self.send_json(self.request(Method::PATCH, "/api/auth/role").json(payload))
    }

    pub fn create_user(&self, payload: &CreateUserRequest) -> Result<CreateUserResponse, ApiError> {
        self.send_json(self.request(Method::POST, "/api/auth/admin/users").json(payload))
    }

    pub fn delete_teacher(&self, email: &str) -> Result<(), ApiError> {
        let encoded = utf8_percent_encode(email, PATH_SEGMENT);
        self.send_unit(self.request(Method::DELETE, &format!("/api/admin/teachers/{encoded}")))
    }

    // -- students -----------------------------------------------------------

    pub fn list_students(
        &self,
        name: Option<&str>,
        branch: Option<&str>,
    ) -> Result<Vec<Student>, ApiError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        for (key, value) in [("name", name), ("branch", branch)] {
            if let Some(value) = value {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    query.push((key, trimmed.to_string()));
                }
            }
        }
        self.send_json(self.request(Method::GET, "/students").query(&query))
    }

    pub fn get_student(&self, id: i64) -> Result<Student, ApiError> {
        self.send_json(self.request(Method::GET, &format!("/students/{id}")))
    }

    pub fn create_student(&self, student: &Student) -> Result<Student, ApiError> {
        self.send_json(self.request(Method::POST, "/students").json(student))
    }

    pub fn update_student(&self, id: i64, student: &Student) -> Result<Student, ApiError> {
        self.send_json(
            self.request(Method::PUT, &format!("/students/{id}"))
                .json(student),
        )
    }

    pub fn delete_student(&self, id: i64) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::DELETE, &format!("/students/{id}")))
    }

    pub fn students_count(&self) -> Result<i64, ApiError> {
        self.send_json(self.request(Method::GET, "/students/count"))
    }

    /// Bulk roster import. The backend ingests the same CSV shape the
    /// export side produces.
    pub fn bulk_import_students(&self, csv: String) -> Result<String, ApiError> {
        self.send_text(
            self.request(Method::POST, "/students/bulk-upload")
                .header(reqwest::header::CONTENT_TYPE, "text/csv")
                .body(csv),
        )
    }

    pub fn progress_report(&self, student_id: i64) -> Result<String, ApiError> {
        self.send_text(self.request(Method::GET, &format!("/students/{student_id}/progress-report")))
    }

    // -- marks --------------------------------------------------------------

    pub fn list_marks(&self, student_id: i64) -> Result<Vec<StudentMark>, ApiError> {
        self.send_json(self.request(Method::GET, &format!("/students/{student_id}/marks")))
    }

    pub fn add_mark(&self, student_id: i64, mark: &StudentMark) -> Result<StudentMark, ApiError> {
        self.send_json(
            self.request(Method::POST, &format!("/students/{student_id}/marks"))
                .json(mark),
        )
    }

    pub fn update_mark(
        &self,
        student_id: i64,
        mark_id: i64,
        mark: &StudentMark,
    ) -> Result<StudentMark, ApiError> {
        self.send_json(
            self.request(Method::PUT, &format!("/students/{student_id}/marks/{mark_id}"))
                .json(mark),
        )
    }

    pub fn delete_mark(&self, student_id: i64, mark_id: i64) -> Result<(), ApiError> {
        self.send_unit(
            self.request(
                Method::DELETE,
                &format!("/students/{student_id}/marks/{mark_id}"),
            ),
        )
    }

    pub fn marks_card(&self, student_id: i64) -> Result<MarksCard, ApiError> {
        self.send_json(self.request(Method::GET, &format!("/students/{student_id}/marks-card")))
    }

    pub fn performance_summary(&self) -> Result<Vec<StudentPerformance>, ApiError> {
        self.send_json(self.request(Method::GET, "/students/performance-summary"))
    }

    // -- courses ------------------------------------------------------------

    pub fn list_courses(
        &self,
        name: Option<&str>,
        code: Option<&str>,
    ) -> Result<Vec<Course>, ApiError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        for (key, value) in [("name", name), ("code", code)] {
            if let Some(value) = value {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    query.push((key, trimmed.to_string()));
                }
            }
        }
        self.send_json(self.request(Method::GET, "/courses").query(&query))
    }

    pub fn get_course(&self, id: i64) -> Result<Course, ApiError> {
        self.send_json(self.request(Method::GET, &format!("/courses/{id}")))
    }

    pub fn create_course(&self, course: &Course) -> Result<Course, ApiError> {
        self.send_json(self.request(Method::POST, "/courses").json(course))
    }

    pub fn update_course(&self, id: i64, course: &Course) -> Result<Course, ApiError> {
        self.send_json(
            self.request(Method::PUT, &format!("/courses/{id}"))
                .json(course),
        )
    }

    pub fn delete_course(&self, id: i64) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::DELETE, &format!("/courses/{id}")))
    }

    pub fn courses_count(&self) -> Result<i64, ApiError> {
        self.send_json(self.request(Method::GET, "/courses/count"))
    }

    pub fn enroll_student(&self, course_id: i64, student_id: i64) -> Result<Course, ApiError> {
        self.send_json(
            self.request(
                Method::POST,
                &format!("/courses/{course_id}/students/{student_id}"),
            )
            .json(&serde_json::json!({})),
        )
    }

    pub fn unenroll_student(&self, course_id: i64, student_id: i64) -> Result<Course, ApiError> {
        self.send_json(self.request(
            Method::DELETE,
            &format!("/courses/{course_id}/students/{student_id}"),
        ))
    }

    pub fn courses_for_student(&self, student_id: i64) -> Result<Vec<Course>, ApiError> {
        self.send_json(self.request(Method::GET, &format!("/courses/student/{student_id}")))
    }

    // -- admin --------------------------------------------------------------

    pub fn email_status(&self) -> Result<Vec<EmailNotification>, ApiError> {
        self.send_json(self.request(Method::GET, "/api/admin/email-status"))
    }

    pub fn clear_email_status(&self) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::DELETE, "/api/admin/email-status"))
    }

    pub fn in_app_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        self.send_json(self.request(Method::GET, "/api/admin/in-app-notifications"))
    }

    pub fn clear_in_app_notifications(&self) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::DELETE, "/api/admin/in-app-notifications"))
    }

    pub fn mark_notification_read(&self, id: i64) -> Result<Notification, ApiError> {
        self.send_json(
            self.request(
                Method::PATCH,
                &format!("/api/admin/in-app-notifications/{id}/read"),
            )
            .json(&serde_json::json!({})),
        )
    }

    pub fn send_broadcast_email(
        &self,
        subject: &str,
        message: &str,
    ) -> Result<BroadcastEmailResponse, ApiError> {
        self.send_json(
            self.request(Method::POST, "/api/admin/email-broadcast")
                .json(&serde_json::json!({ "subject": subject, "message": message })),
        )
    }

    pub fn send_student_email(
        &self,
        student_id: i64,
        subject: &str,
        message: &str,
    ) -> Result<IndividualEmailResponse, ApiError> {
        self.send_json(self.request(Method::POST, "/api/admin/email-student").json(
            &serde_json::json!({
                "studentId": student_id,
                "subject": subject,
                "message": message
            }),
        ))
    }

    pub fn email_queue(&self) -> Result<Vec<EmailNotification>, ApiError> {
        self.send_json(self.request(Method::GET, "/api/admin/monitoring/email-queue"))
    }

    pub fn process_email_queue(&self) -> Result<(), ApiError> {
        self.send_unit(
            self.request(Method::POST, "/api/admin/monitoring/email-queue/process")
                .json(&serde_json::json!({})),
        )
    }

    pub fn daily_reports(&self) -> Result<Vec<DailyReportLog>, ApiError> {
        self.send_json(self.request(Method::GET, "/api/admin/monitoring/daily-reports"))
    }

    pub fn report_schedule(&self) -> Result<ReportScheduleConfig, ApiError> {
        self.send_json(self.request(Method::GET, "/api/admin/monitoring/report-schedule"))
    }

    pub fn update_report_schedule(
        &self,
        hour: u32,
        minute: u32,
    ) -> Result<ReportScheduleConfig, ApiError> {
        self.send_json(
            self.request(Method::PUT, "/api/admin/monitoring/report-schedule")
                .query(&[("hour", hour), ("minute", minute)])
                .json(&serde_json::json!({})),
        )
    }

    pub fn trigger_daily_report(&self) -> Result<String, ApiError> {
        self.send_text(
            self.request(Method::POST, "/api/admin/monitoring/daily-report/trigger")
                .json(&serde_json::json!({})),
        )
    }

    pub fn trigger_progress_analytics_report(&self) -> Result<String, ApiError> {
        self.send_text(
            self.request(
                Method::POST,
                "/api/admin/monitoring/progress-analytics-report/trigger",
            )
            .json(&serde_json::json!({})),
        )
    }
}
