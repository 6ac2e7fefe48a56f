use std::sync::Arc;

use tracing::info;

use super::domain::{NewVisit, Visit, VisitId};
use super::lifecycle::{apply, VisitCommand, VisitLifecycleError};
use super::repository::{RepositoryError, VisitRepository};
use crate::clock::Clock;
use crate::workflows::audit::Actor;

pub struct VisitService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> VisitService<R>
where
    R: VisitRepository + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub fn register(&self, visit: NewVisit, actor: &Actor) -> Result<Visit, VisitServiceError> {
        let record = visit.into_visit(VisitId::generate(), actor, self.clock.now());
        let stored = self.repository.insert(record)?;
        info!(visit_id = %stored.id, visitor = %stored.visitor_name, "visitor checked in");
        Ok(stored)
    }

    pub fn get(&self, id: &VisitId) -> Result<Visit, VisitServiceError> {
        let visit = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(visit)
    }

    pub fn list(&self) -> Result<Vec<Visit>, VisitServiceError> {
        Ok(self.repository.list()?)
    }

    pub fn delete(&self, id: &VisitId) -> Result<(), VisitServiceError> {
        self.repository.delete(id)?;
        info!(visit_id = %id, "visit deleted");
        Ok(())
    }

    pub fn execute(
        &self,
        id: &VisitId,
        command: VisitCommand,
        actor: &Actor,
    ) -> Result<Visit, VisitServiceError> {
        let now = self.clock.now();
        let mut outcome = None;
        self.repository.modify(id, |current| {
            let result = apply(current, command, actor, now);
            let write = result.as_ref().ok().cloned();
            outcome = Some(result);
            write
        })?;
        let next = outcome.ok_or(RepositoryError::NotFound)??;
        info!(
            visit_id = %id,
            status = %next.status,
            user_id = %actor.user_id,
            "visit updated"
        );
        Ok(next)
    }

    pub fn admin_check_out(&self, id: &VisitId, actor: &Actor) -> Result<Visit, VisitServiceError> {
        self.execute(id, VisitCommand::AdminCheckOut, actor)
    }

    pub fn admin_check_in(&self, id: &VisitId, actor: &Actor) -> Result<Visit, VisitServiceError> {
        self.execute(id, VisitCommand::AdminCheckIn, actor)
    }

    pub fn toggle_status(&self, id: &VisitId, actor: &Actor) -> Result<Visit, VisitServiceError> {
        self.execute(id, VisitCommand::ToggleStatus, actor)
    }

    pub fn assign_staff(
        &self,
        id: &VisitId,
        staff_name: impl Into<String>,
        actor: &Actor,
    ) -> Result<Visit, VisitServiceError> {
        let command = VisitCommand::AssignStaff {
            staff_name: staff_name.into(),
        };
        self.execute(id, command, actor)
    }

    pub fn assign_doctor(
        &self,
        id: &VisitId,
        doctor_name: impl Into<String>,
        actor: &Actor,
    ) -> Result<Visit, VisitServiceError> {
        let command = VisitCommand::AssignDoctor {
            doctor_name: doctor_name.into(),
        };
        self.execute(id, command, actor)
    }

    pub fn edit_details(
        &self,
        id: &VisitId,
        text: impl Into<String>,
        actor: &Actor,
    ) -> Result<Visit, VisitServiceError> {
        self.execute(id, VisitCommand::EditDetails { text: text.into() }, actor)
    }

    pub fn save_doctor_remarks(
        &self,
        id: &VisitId,
        remarks: impl Into<String>,
        actor: &Actor,
    ) -> Result<Visit, VisitServiceError> {
        let command = VisitCommand::SaveDoctorRemarks {
            remarks: remarks.into(),
        };
        self.execute(id, command, actor)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VisitServiceError {
    #[error(transparent)]
    Lifecycle(#[from] VisitLifecycleError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
