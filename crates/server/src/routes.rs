//! REST handlers. Each one is a direct call into the lifecycle manager.

use std::sync::Arc;
use std::time::Duration;
use axum::{
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use internhub_core::{Attachment, MentorId, NotificationId, RecipientKind, ReportId, ReportType, StudentId};
use internhub_lifecycle::{AnalyticsScope, SubmitReport};
use serde::Deserialize;
use serde_json::json;
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the authenticated caller's identifier.
pub const USER_HEADER: &str = "x-user-id";

type Shared = State<Arc<AppState>>;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(USER_HEADER)])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(health))
        .route("/api/v1/reports/submit", post(submit_report))
        .route("/api/v1/reports/analytics", get(report_analytics))
        .route("/api/v1/reports/student/{student_id}", get(student_reports))
        .route("/api/v1/reports/mentor/{mentor_id}", get(mentor_reports))
        .route("/api/v1/reports/{report_id}/submit", post(submit_pending_report))
        .route("/api/v1/reports/{report_id}/evaluate", post(evaluate_report))
        .route("/api/v1/notifications", get(list_notifications))
        .route("/api/v1/notifications/{notification_id}/mark-read", patch(mark_notification_read))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {what} ID: {raw}")))
}

fn caller<T: std::str::FromStr>(headers: &HeaderMap) -> Result<T, ApiError> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or(ApiError::Unauthorized)
}

async fn health() -> &'static str {
    "Server is running ..."
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody {
    #[serde(rename = "type")]
    kind: ReportType,
    title: String,
    content: String,
    #[serde(default)]
    attachments: Vec<Attachment>,
}

async fn submit_report(
    State(state): Shared,
    headers: HeaderMap,
    Json(body): Json<SubmitBody>,
) -> Result<impl IntoResponse, ApiError> {
    let student: StudentId = caller(&headers)?;
    let report = state
        .manager
        .submit(SubmitReport {
            student,
            kind: body.kind,
            title: body.title,
            content: body.content,
            attachments: body.attachments,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Report submitted successfully", "report": report })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitPendingBody {
    title: String,
    content: String,
    #[serde(default)]
    attachments: Vec<Attachment>,
}

async fn submit_pending_report(
    State(state): Shared,
    Path(report_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<SubmitPendingBody>,
) -> Result<impl IntoResponse, ApiError> {
    let student: StudentId = caller(&headers)?;
    let report_id: ReportId = parse_id(&report_id, "report")?;
    let report = state
        .manager
        .submit_pending(report_id, student, body.title, body.content, body.attachments)
        .await?;

    Ok(Json(json!({ "message": "Report submitted successfully", "report": report })))
}

#[derive(Debug, Deserialize)]
struct EvaluateBody {
    points: f32,
    #[serde(default)]
    feedback: String,
}

async fn evaluate_report(
    State(state): Shared,
    Path(report_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<EvaluateBody>,
) -> Result<impl IntoResponse, ApiError> {
    let mentor: MentorId = caller(&headers)?;
    let report_id: ReportId = parse_id(&report_id, "report")?;
    let report = state
        .manager
        .evaluate(report_id, body.points, body.feedback, mentor)
        .await?;

    Ok(Json(json!({ "message": "Report evaluated successfully", "report": report })))
}

async fn student_reports(
    State(state): Shared,
    Path(student_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let student: StudentId = parse_id(&student_id, "student")?;
    Ok(Json(state.manager.reports_for_student(student).await?))
}

async fn mentor_reports(
    State(state): Shared,
    Path(mentor_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mentor: MentorId = parse_id(&mentor_id, "mentor")?;
    Ok(Json(state.manager.reports_for_mentor(mentor).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyticsQuery {
    student_id: Option<String>,
    mentor_id: Option<String>,
}

async fn report_analytics(
    State(state): Shared,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = match (query.student_id, query.mentor_id) {
        (Some(id), _) => AnalyticsScope::Student(parse_id(&id, "student")?),
        (None, Some(id)) => AnalyticsScope::Mentor(parse_id(&id, "mentor")?),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "studentId or mentorId is required".to_string(),
            ))
        }
    };
    Ok(Json(state.manager.analytics(scope).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationsQuery {
    user_id: String,
    user_type: String,
}

async fn list_notifications(
    State(state): Shared,
    Query(query): Query<NotificationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind: RecipientKind = query.user_type.parse().map_err(ApiError::BadRequest)?;
    Ok(Json(state.inbox.list(&query.user_id, kind).await?))
}

async fn mark_notification_read(
    State(state): Shared,
    Path(notification_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: NotificationId = parse_id(&notification_id, "notification")?;
    state.inbox.mark_read(id).await?;
    Ok(Json(json!({ "message": "Notification marked as read" })))
}
