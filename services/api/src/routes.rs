use crate::infra::{AlertFeed, ApiEnquiryService, AppState, Services};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use clinic_desk::error::AppError;
use clinic_desk::workflows::analytics::{analytics_router, AnalyticsState};
use clinic_desk::workflows::directory::directory_router;
use clinic_desk::workflows::enquiry::{enquiry_router, EnquiryId, ReminderAlert};
use clinic_desk::workflows::visit::visit_router;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct NotificationFeedState {
    pub(crate) enquiries: Arc<ApiEnquiryService>,
    pub(crate) alerts: Arc<AlertFeed>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PendingNotice {
    pub(crate) enquiry_id: EnquiryId,
    pub(crate) enquirer_name: String,
    pub(crate) patient_name: String,
    pub(crate) pending_since: Option<DateTime<Utc>>,
    pub(crate) returned_by_reminder: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct NotificationFeed {
    pub(crate) pending: Vec<PendingNotice>,
    pub(crate) recent_alerts: Vec<ReminderAlert>,
}

pub(crate) fn with_service_routes(services: &Services) -> Router {
    let analytics = AnalyticsState {
        visits: services.visits.clone(),
        enquiries: services.enquiries.clone(),
    };
    let feed = NotificationFeedState {
        enquiries: services.enquiries.clone(),
        alerts: services.alerts.clone(),
    };

    Router::new()
        .merge(enquiry_router(services.enquiries.clone()))
        .merge(visit_router(services.visits.clone()))
        .merge(directory_router(services.directory.clone()))
        .merge(analytics_router(analytics))
        .merge(
            Router::new()
                .route("/api/v1/notifications", get(notifications_endpoint))
                .with_state(feed),
        )
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Pending enquiries plus the alerts this process raised most recently.
pub(crate) async fn notifications_endpoint(
    State(state): State<NotificationFeedState>,
) -> Result<Json<NotificationFeed>, AppError> {
    let pending = state
        .enquiries
        .pending()?
        .into_iter()
        .map(|record| PendingNotice {
            returned_by_reminder: record.notification.reminder_expired_at.is_some(),
            pending_since: record.notification.pending_since,
            enquiry_id: record.id,
            enquirer_name: record.enquirer_name,
            patient_name: record.patient_name,
        })
        .collect();

    Ok(Json(NotificationFeed {
        pending,
        recent_alerts: state.alerts.recent(),
    }))
}
