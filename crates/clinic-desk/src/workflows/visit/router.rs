use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use super::domain::{NewVisit, VisitId};
use super::lifecycle::VisitCommand;
use super::repository::VisitRepository;
use super::service::{VisitService, VisitServiceError};
use crate::workflows::http::{actor_from_headers, error_response, repository_status};

/// Router builder for the visits table and visit details page.
pub fn visit_router<R>(service: Arc<VisitService<R>>) -> Router
where
    R: VisitRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/visits",
            post(register_handler::<R>).get(list_handler::<R>),
        )
        .route(
            "/api/v1/visits/:visit_id",
            get(get_handler::<R>).delete(delete_handler::<R>),
        )
        .route(
            "/api/v1/visits/:visit_id/check-out",
            post(command_handler::<R, CheckOut>),
        )
        .route(
            "/api/v1/visits/:visit_id/check-in",
            post(command_handler::<R, CheckIn>),
        )
        .route(
            "/api/v1/visits/:visit_id/toggle",
            post(command_handler::<R, Toggle>),
        )
        .route(
            "/api/v1/visits/:visit_id/assign-staff",
            post(assign_staff_handler::<R>),
        )
        .route(
            "/api/v1/visits/:visit_id/assign-doctor",
            post(assign_doctor_handler::<R>),
        )
        .route(
            "/api/v1/visits/:visit_id/details",
            post(details_handler::<R>),
        )
        .route(
            "/api/v1/visits/:visit_id/doctor-remarks",
            post(remarks_handler::<R>),
        )
        .with_state(service)
}

/// Body-less commands addressed by route.
trait FixedCommand {
    fn command() -> VisitCommand;
}

struct CheckOut;
struct CheckIn;
struct Toggle;

impl FixedCommand for CheckOut {
    fn command() -> VisitCommand {
        VisitCommand::AdminCheckOut
    }
}

impl FixedCommand for CheckIn {
    fn command() -> VisitCommand {
        VisitCommand::AdminCheckIn
    }
}

impl FixedCommand for Toggle {
    fn command() -> VisitCommand {
        VisitCommand::ToggleStatus
    }
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

pub(crate) fn visit_error_response(error: VisitServiceError) -> Response {
    let status = match &error {
        VisitServiceError::Lifecycle(_) => StatusCode::UNPROCESSABLE_ENTITY,
        VisitServiceError::Repository(inner) => repository_status(inner),
    };
    error_response(status, error)
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, VisitServiceError>) -> Response {
    match result {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(error) => visit_error_response(error),
    }
}

async fn register_handler<R>(
    State(service): State<Arc<VisitService<R>>>,
    headers: HeaderMap,
    axum::Json(visit): axum::Json<NewVisit>,
) -> Response
where
    R: VisitRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond(StatusCode::CREATED, service.register(visit, &actor))
}

async fn list_handler<R>(State(service): State<Arc<VisitService<R>>>) -> Response
where
    R: VisitRepository + 'static,
{
    respond(StatusCode::OK, service.list())
}

async fn get_handler<R>(
    State(service): State<Arc<VisitService<R>>>,
    Path(visit_id): Path<String>,
) -> Response
where
    R: VisitRepository + 'static,
{
    respond(StatusCode::OK, service.get(&VisitId(visit_id)))
}

async fn delete_handler<R>(
    State(service): State<Arc<VisitService<R>>>,
    headers: HeaderMap,
    Path(visit_id): Path<String>,
) -> Response
where
    R: VisitRepository + 'static,
{
    if let Err(rejection) = actor_from_headers(&headers) {
        return rejection;
    }
    match service.delete(&VisitId(visit_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => visit_error_response(error),
    }
}

async fn run_command<R>(
    service: Arc<VisitService<R>>,
    headers: HeaderMap,
    visit_id: String,
    command: VisitCommand,
) -> Response
where
    R: VisitRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection,
    };
    respond(
        StatusCode::OK,
        service.execute(&VisitId(visit_id), command, &actor),
    )
}

async fn command_handler<R, C>(
    State(service): State<Arc<VisitService<R>>>,
    headers: HeaderMap,
    Path(visit_id): Path<String>,
) -> Response
where
    R: VisitRepository + 'static,
    C: FixedCommand + Send + Sync + 'static,
{
    run_command(service, headers, visit_id, C::command()).await
}

async fn assign_staff_handler<R>(
    State(service): State<Arc<VisitService<R>>>,
    headers: HeaderMap,
    Path(visit_id): Path<String>,
    axum::Json(body): axum::Json<StaffAssignment>,
) -> Response
where
    R: VisitRepository + 'static,
{
    let command = VisitCommand::AssignStaff {
        staff_name: body.staff_name,
    };
    run_command(service, headers, visit_id, command).await
}

async fn assign_doctor_handler<R>(
    State(service): State<Arc<VisitService<R>>>,
    headers: HeaderMap,
    Path(visit_id): Path<String>,
    axum::Json(body): axum::Json<DoctorAssignment>,
) -> Response
where
    R: VisitRepository + 'static,
{
    let command = VisitCommand::AssignDoctor {
        doctor_name: body.doctor_name,
    };
    run_command(service, headers, visit_id, command).await
}

async fn details_handler<R>(
    State(service): State<Arc<VisitService<R>>>,
    headers: HeaderMap,
    Path(visit_id): Path<String>,
    axum::Json(body): axum::Json<DetailsUpdate>,
) -> Response
where
    R: VisitRepository + 'static,
{
    let command = VisitCommand::EditDetails { text: body.text };
    run_command(service, headers, visit_id, command).await
}

async fn remarks_handler<R>(
    State(service): State<Arc<VisitService<R>>>,
    headers: HeaderMap,
    Path(visit_id): Path<String>,
    axum::Json(body): axum::Json<RemarksUpdate>,
) -> Response
where
    R: VisitRepository + 'static,
{
    let command = VisitCommand::SaveDoctorRemarks {
        remarks: body.remarks,
    };
    run_command(service, headers, visit_id, command).await
}
