//! Doctors and staff members offered as assignees on visits and enquiries.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::Clock;
use crate::store::RepositoryError;
use crate::workflows::http::{actor_from_headers, error_response, repository_status};

pub const DOCTOR_TITLE: &str = "Dr.";

/// Display form of a doctor's name. Names already carrying the title are left as they are.
pub fn doctor_label(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.starts_with(DOCTOR_TITLE) {
        trimmed.to_string()
    } else {
        format!("{DOCTOR_TITLE} {trimmed}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DirectoryId(pub String);

impl DirectoryId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DirectoryId,
    pub doctor_name: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: DirectoryId,
    pub staff_name: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("name must not be blank")]
    BlankName,
    #[error("doctor name must include more than the title")]
    TitleOnly,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub trait DirectoryRepository: Send + Sync {
    fn insert_doctor(&self, doctor: Doctor) -> Result<Doctor, RepositoryError>;
    fn remove_doctor(&self, id: &DirectoryId) -> Result<(), RepositoryError>;
    /// Doctors ordered by name.
    fn doctors(&self) -> Result<Vec<Doctor>, RepositoryError>;
    fn insert_staff(&self, member: StaffMember) -> Result<StaffMember, RepositoryError>;
    /// Staff ordered by name.
    fn staff(&self) -> Result<Vec<StaffMember>, RepositoryError>;
}

pub struct DirectoryService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> DirectoryService<R>
where
    R: DirectoryRepository + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub fn add_doctor(&self, name: &str) -> Result<Doctor, DirectoryError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DirectoryError::BlankName);
        }
        if trimmed == DOCTOR_TITLE {
            return Err(DirectoryError::TitleOnly);
        }

        let doctor = self.repository.insert_doctor(Doctor {
            id: DirectoryId::generate(),
            doctor_name: doctor_label(trimmed),
            added_at: self.clock.now(),
        })?;
        info!(doctor_id = %doctor.id.0, name = %doctor.doctor_name, "doctor added");
        Ok(doctor)
    }

    pub fn remove_doctor(&self, id: &DirectoryId) -> Result<(), DirectoryError> {
        self.repository.remove_doctor(id)?;
        info!(doctor_id = %id.0, "doctor removed");
        Ok(())
    }

    pub fn doctors(&self) -> Result<Vec<Doctor>, DirectoryError> {
        Ok(self.repository.doctors()?)
    }

    pub fn add_staff(&self, name: &str) -> Result<StaffMember, DirectoryError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DirectoryError::BlankName);
        }

        let member = self.repository.insert_staff(StaffMember {
            id: DirectoryId::generate(),
            staff_name: trimmed.to_string(),
            added_at: self.clock.now(),
        })?;
        info!(staff_id = %member.id.0, name = %member.staff_name, "staff member added");
        Ok(member)
    }

    pub fn list_staff(&self) -> Result<Vec<StaffMember>, DirectoryError> {
        Ok(self.repository.staff()?)
    }
}

#[derive(Debug, Deserialize)]
pub struct NewDoctor {
    pub doctor_name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewStaffMember {
    pub staff_name: String,
}

pub fn directory_router<R>(service: Arc<DirectoryService<R>>) -> Router
where
    R: DirectoryRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/doctors",
            get(list_doctors_handler::<R>).post(add_doctor_handler::<R>),
        )
        .route(
            "/api/v1/doctors/:doctor_id",
            delete(remove_doctor_handler::<R>),
        )
        .route(
            "/api/v1/staff",
            get(list_staff_handler::<R>).post(add_staff_handler::<R>),
        )
        .with_state(service)
}

pub(crate) fn directory_error_response(error: DirectoryError) -> Response {
    let status = match &error {
        DirectoryError::BlankName | DirectoryError::TitleOnly => StatusCode::UNPROCESSABLE_ENTITY,
        DirectoryError::Repository(inner) => repository_status(inner),
    };
    error_response(status, error)
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, DirectoryError>) -> Response {
    match result {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

async fn list_doctors_handler<R>(State(service): State<Arc<DirectoryService<R>>>) -> Response
where
    R: DirectoryRepository + 'static,
{
    respond(StatusCode::OK, service.doctors())
}

async fn add_doctor_handler<R>(
    State(service): State<Arc<DirectoryService<R>>>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<NewDoctor>,
) -> Response
where
    R: DirectoryRepository + 'static,
{
    if let Err(rejection) = actor_from_headers(&headers) {
        return rejection;
    }
    respond(StatusCode::CREATED, service.add_doctor(&body.doctor_name))
}

async fn remove_doctor_handler<R>(
    State(service): State<Arc<DirectoryService<R>>>,
    headers: HeaderMap,
    Path(doctor_id): Path<String>,
) -> Response
where
    R: DirectoryRepository + 'static,
{
    if let Err(rejection) = actor_from_headers(&headers) {
        return rejection;
    }
    match service.remove_doctor(&DirectoryId(doctor_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => directory_error_response(error),
    }
}

async fn list_staff_handler<R>(State(service): State<Arc<DirectoryService<R>>>) -> Response
where
    R: DirectoryRepository + 'static,
{
    respond(StatusCode::OK, service.list_staff())
}

async fn add_staff_handler<R>(
    State(service): State<Arc<DirectoryService<R>>>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<NewStaffMember>,
) -> Response
where
    R: DirectoryRepository + 'static,
{
    if let Err(rejection) = actor_from_headers(&headers) {
        return rejection;
    }
    respond(StatusCode::CREATED, service.add_staff(&body.staff_name))
}
