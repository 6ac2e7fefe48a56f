use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{EnquiryId, NewEnquiry, ReminderDuration};
use super::lifecycle::{EnquiryCommand, LifecycleError};
use super::notification::{MarkerStore, NotificationSink};
use super::repository::{EnquiryQuery, EnquiryRepository};
use super::service::{EnquiryService, EnquiryServiceError};
use crate::workflows::http::{actor_from_headers, error_response, repository_status};

type SharedService<R, M, N> = Arc<EnquiryService<R, M, N>>;

/// Router builder exposing the enquiry table, details page actions, and reminder controls.
pub fn enquiry_router<R, M, N>(service: SharedService<R, M, N>) -> Router
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/enquiries",
            post(create_handler::<R, M, N>).get(list_handler::<R, M, N>),
        )
        .route("/api/v1/enquiries/pending", get(pending_handler::<R, M, N>))
        .route(
            "/api/v1/enquiries/:enquiry_id",
            get(get_handler::<R, M, N>).delete(delete_handler::<R, M, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/assign-staff",
            post(assign_staff_handler::<R, M, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/assign-doctor",
            post(assign_doctor_handler::<R, M, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/complete",
            post(complete_handler::<R, M, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/cancel",
            post(cancel_handler::<R, M, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/details",
            post(details_handler::<R, M, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/doctor-remarks",
            post(remarks_handler::<R, M, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/reminder",
            get(reminder_status_handler::<R, M, N>)
                .post(set_reminder_handler::<R, M, N>)
                .delete(cancel_reminder_handler::<R, M, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/timeline",
            get(timeline_handler::<R, M, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/check",
            post(check_handler::<R, M, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct StaffAssignment {
    pub staff_name: String,
}

#[derive(Debug, Deserialize)]
pub struct DoctorAssignment {
    pub doctor_name: String,
}

#[derive(Debug, Deserialize)]
pub struct DetailsUpdate {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct RemarksUpdate {
    pub remarks: String,
}

#[derive(Debug, Deserialize)]
pub struct ReminderRequest {
    pub duration_hours: ReminderDuration,
}

pub(crate) fn service_error_response(error: EnquiryServiceError) -> Response {
    let status = match &error {
        EnquiryServiceError::Intake(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EnquiryServiceError::Lifecycle(LifecycleError::ReminderAlreadyActive) => {
            StatusCode::CONFLICT
        }
        EnquiryServiceError::Lifecycle(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EnquiryServiceError::Repository(inner) => repository_status(inner),
    };
    error_response(status, error)
}

fn respond<T: serde::Serialize>(
    status: StatusCode,
    result: Result<T, EnquiryServiceError>,
) -> Response {
    match result {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn create_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
    headers: HeaderMap,
    axum::Json(submission): axum::Json<NewEnquiry>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond(StatusCode::CREATED, service.create(submission, &actor))
}

pub(crate) async fn list_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
    Query(query): Query<EnquiryQuery>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    respond(StatusCode::OK, service.list(&query))
}

pub(crate) async fn pending_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    respond(StatusCode::OK, service.pending())
}

pub(crate) async fn get_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
    Path(enquiry_id): Path<String>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    respond(StatusCode::OK, service.get(&EnquiryId(enquiry_id)))
}

pub(crate) async fn delete_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
    headers: HeaderMap,
    Path(enquiry_id): Path<String>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    if let Err(rejection) = actor_from_headers(&headers) {
        return rejection;
    }
    match service.delete(&EnquiryId(enquiry_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => service_error_response(error),
    }
}

async fn run_command<R, M, N>(
    service: SharedService<R, M, N>,
    headers: HeaderMap,
    enquiry_id: String,
    command: EnquiryCommand,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond(
        StatusCode::OK,
        service.execute(&EnquiryId(enquiry_id), command, &actor),
    )
}

pub(crate) async fn assign_staff_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
    headers: HeaderMap,
    Path(enquiry_id): Path<String>,
    axum::Json(body): axum::Json<StaffAssignment>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    let command = EnquiryCommand::AssignStaff {
        staff_name: body.staff_name,
    };
    run_command(service, headers, enquiry_id, command).await
}

pub(crate) async fn assign_doctor_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
    headers: HeaderMap,
    Path(enquiry_id): Path<String>,
    axum::Json(body): axum::Json<DoctorAssignment>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    let command = EnquiryCommand::AssignDoctor {
        doctor_name: body.doctor_name,
    };
    run_command(service, headers, enquiry_id, command).await
}

pub(crate) async fn complete_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
    headers: HeaderMap,
    Path(enquiry_id): Path<String>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    run_command(service, headers, enquiry_id, EnquiryCommand::MarkCompleted).await
}

pub(crate) async fn cancel_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
    headers: HeaderMap,
    Path(enquiry_id): Path<String>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    run_command(service, headers, enquiry_id, EnquiryCommand::Cancel).await
}

pub(crate) async fn details_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
    headers: HeaderMap,
    Path(enquiry_id): Path<String>,
    axum::Json(body): axum::Json<DetailsUpdate>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    let command = EnquiryCommand::EditDetails { text: body.text };
    run_command(service, headers, enquiry_id, command).await
}

pub(crate) async fn remarks_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
    headers: HeaderMap,
    Path(enquiry_id): Path<String>,
    axum::Json(body): axum::Json<RemarksUpdate>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    let command = EnquiryCommand::SaveDoctorRemarks {
        remarks: body.remarks,
    };
    run_command(service, headers, enquiry_id, command).await
}

pub(crate) async fn reminder_status_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
    Path(enquiry_id): Path<String>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    respond(
        StatusCode::OK,
        service.reminder_status(&EnquiryId(enquiry_id)),
    )
}

pub(crate) async fn set_reminder_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
    headers: HeaderMap,
    Path(enquiry_id): Path<String>,
    axum::Json(body): axum::Json<ReminderRequest>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    let command = EnquiryCommand::SetReminder {
        duration: body.duration_hours,
    };
    run_command(service, headers, enquiry_id, command).await
}

pub(crate) async fn cancel_reminder_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
    headers: HeaderMap,
    Path(enquiry_id): Path<String>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    run_command(service, headers, enquiry_id, EnquiryCommand::CancelReminder).await
}

pub(crate) async fn timeline_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
    Path(enquiry_id): Path<String>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    respond(StatusCode::OK, service.timeline(&EnquiryId(enquiry_id)))
}

/// Load-time expiry check for a viewer opening the record.
pub(crate) async fn check_handler<R, M, N>(
    State(service): State<SharedService<R, M, N>>,
    headers: HeaderMap,
    Path(enquiry_id): Path<String>,
) -> Response
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    let id = EnquiryId(enquiry_id);
    match service.check_on_load(&id, &actor) {
        Ok(alert) => {
            let payload = json!({
                "enquiry_id": id.0,
                "alert": alert,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => service_error_response(error),
    }
}
