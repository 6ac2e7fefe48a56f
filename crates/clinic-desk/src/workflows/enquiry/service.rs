use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::domain::{Enquiry, EnquiryId, EnquiryStatus, IntakeError, NewEnquiry, ReminderDuration};
use super::lifecycle::{apply, EnquiryCommand, LifecycleEffect, LifecycleError, Transition};
use super::notification::{
    MarkerStore, NotificationGate, NotificationPolicy, NotificationSink, ReminderAlert,
};
use super::reminder::ReminderStatusView;
use super::repository::{EnquiryQuery, EnquiryRepository, RecordChange, RepositoryError};
use super::timeline::{timeline, TimelineEvent};
use crate::clock::Clock;
use crate::workflows::audit::Actor;

/// A pending record whose reminder lapsed this recently still alerts on load or sign-in.
const RECENT_EXPIRY_WINDOW_HOURS: i64 = 24;

/// Service composing the lifecycle engine, the record store, and the notification gate.
pub struct EnquiryService<R, M, N> {
    repository: Arc<R>,
    gate: NotificationGate<M>,
    sink: Arc<N>,
    clock: Arc<dyn Clock>,
    marker_retention: Duration,
}

/// Outcome of one pass over records with active reminders.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub examined: usize,
    pub expired: Vec<EnquiryId>,
    pub alerts: Vec<ReminderAlert>,
    pub failures: usize,
}

impl<R, M, N> EnquiryService<R, M, N>
where
    R: EnquiryRepository + 'static,
    M: MarkerStore + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(
        repository: Arc<R>,
        markers: Arc<M>,
        sink: Arc<N>,
        clock: Arc<dyn Clock>,
        policy: NotificationPolicy,
    ) -> Self {
        Self {
            repository,
            gate: NotificationGate::new(policy, markers),
            sink,
            clock,
            marker_retention: Duration::days(7),
        }
    }

    pub fn with_marker_retention(mut self, retention: Duration) -> Self {
        self.marker_retention = retention;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn policy(&self) -> NotificationPolicy {
        self.gate.policy()
    }

    /// Record a front-desk submission.
    pub fn create(
        &self,
        submission: NewEnquiry,
        actor: &Actor,
    ) -> Result<Enquiry, EnquiryServiceError> {
        submission.validate()?;
        let record = submission.into_enquiry(EnquiryId::generate(), actor, self.now());
        let stored = self.repository.insert(record)?;
        info!(enquiry_id = %stored.id, status = %stored.status, "enquiry created");
        Ok(stored)
    }

    pub fn get(&self, id: &EnquiryId) -> Result<Enquiry, EnquiryServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn list(&self, query: &EnquiryQuery) -> Result<Vec<Enquiry>, EnquiryServiceError> {
        Ok(self.repository.list(query)?)
    }

    pub fn pending(&self) -> Result<Vec<Enquiry>, EnquiryServiceError> {
        Ok(self.repository.by_status(EnquiryStatus::Pending)?)
    }

    /// Administrative hard delete. Bypasses the lifecycle engine.
    pub fn delete(&self, id: &EnquiryId) -> Result<(), EnquiryServiceError> {
        self.repository.delete(id)?;
        info!(enquiry_id = %id, "enquiry deleted");
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecordChange> {
        self.repository.subscribe()
    }

    /// Validate `command` against the stored record and persist the result.
    pub fn execute(
        &self,
        id: &EnquiryId,
        command: EnquiryCommand,
        actor: &Actor,
    ) -> Result<Enquiry, EnquiryServiceError> {
        let now = self.now();
        let action = command.action();
        let transition = self.transact(id, command, actor, now)?;

        if transition.requires_write() {
            info!(
                enquiry_id = %id,
                action,
                status = %transition.record.status,
                user_id = %actor.user_id,
                "enquiry updated"
            );
        }

        if let Some(original_status) = expired_from(&transition) {
            self.raise_alert(&transition.record, Some(original_status), actor, now);
        }

        Ok(transition.record)
    }

    pub fn assign_staff(
        &self,
        id: &EnquiryId,
        staff_name: impl Into<String>,
        actor: &Actor,
    ) -> Result<Enquiry, EnquiryServiceError> {
        let command = EnquiryCommand::AssignStaff {
            staff_name: staff_name.into(),
        };
        self.execute(id, command, actor)
    }

    pub fn assign_doctor(
        &self,
        id: &EnquiryId,
        doctor_name: impl Into<String>,
        actor: &Actor,
    ) -> Result<Enquiry, EnquiryServiceError> {
        let command = EnquiryCommand::AssignDoctor {
            doctor_name: doctor_name.into(),
        };
        self.execute(id, command, actor)
    }

    pub fn mark_completed(
        &self,
        id: &EnquiryId,
        actor: &Actor,
    ) -> Result<Enquiry, EnquiryServiceError> {
        self.execute(id, EnquiryCommand::MarkCompleted, actor)
    }

    pub fn cancel(&self, id: &EnquiryId, actor: &Actor) -> Result<Enquiry, EnquiryServiceError> {
        self.execute(id, EnquiryCommand::Cancel, actor)
    }

    pub fn edit_details(
        &self,
        id: &EnquiryId,
        text: impl Into<String>,
        actor: &Actor,
    ) -> Result<Enquiry, EnquiryServiceError> {
        let command = EnquiryCommand::EditDetails { text: text.into() };
        self.execute(id, command, actor)
    }

    pub fn save_doctor_remarks(
        &self,
        id: &EnquiryId,
        remarks: impl Into<String>,
        actor: &Actor,
    ) -> Result<Enquiry, EnquiryServiceError> {
        let command = EnquiryCommand::SaveDoctorRemarks {
            remarks: remarks.into(),
        };
        self.execute(id, command, actor)
    }

    pub fn set_reminder(
        &self,
        id: &EnquiryId,
        duration: ReminderDuration,
        actor: &Actor,
    ) -> Result<Enquiry, EnquiryServiceError> {
        self.execute(id, EnquiryCommand::SetReminder { duration }, actor)
    }

    pub fn cancel_reminder(
        &self,
        id: &EnquiryId,
        actor: &Actor,
    ) -> Result<Enquiry, EnquiryServiceError> {
        self.execute(id, EnquiryCommand::CancelReminder, actor)
    }

    pub fn reminder_status(&self, id: &EnquiryId) -> Result<ReminderStatusView, EnquiryServiceError> {
        let record = self.get(id)?;
        Ok(ReminderStatusView::for_enquiry(&record, self.now()))
    }

    pub fn timeline(&self, id: &EnquiryId) -> Result<Vec<TimelineEvent>, EnquiryServiceError> {
        let record = self.get(id)?;
        Ok(timeline(&record, self.now()))
    }

    /// Return every overdue reminder to pending. With a `focus`, alerts are raised only for
    /// that record (a viewer watching one enquiry); without one, every expiry alerts.
    ///
    /// Per-record write failures are logged and left for the next pass.
    pub fn sweep_expired_reminders(
        &self,
        focus: Option<&EnquiryId>,
        actor: &Actor,
    ) -> Result<SweepReport, EnquiryServiceError> {
        self.sweep(focus, actor, AlertDelivery::Viewer)
    }

    /// Sweep for a process nobody is watching. Every expiry is published to the sink, but no
    /// "last shown" marker is written, so the first person to open the record still gets the
    /// pop-up.
    pub fn sweep_unattended(&self, actor: &Actor) -> Result<SweepReport, EnquiryServiceError> {
        self.sweep(None, actor, AlertDelivery::Unattended)
    }

    fn sweep(
        &self,
        focus: Option<&EnquiryId>,
        actor: &Actor,
        delivery: AlertDelivery,
    ) -> Result<SweepReport, EnquiryServiceError> {
        let candidates = self.repository.with_active_reminders()?;
        let now = self.now();
        let mut report = SweepReport {
            examined: candidates.len(),
            ..SweepReport::default()
        };

        for record in candidates {
            let transition =
                match self.transact(&record.id, EnquiryCommand::ExpireReminder, actor, now) {
                    Ok(transition) => transition,
                    Err(EnquiryServiceError::Repository(RepositoryError::NotFound)) => {
                        debug!(enquiry_id = %record.id, "enquiry deleted before its reminder expired");
                        continue;
                    }
                    Err(EnquiryServiceError::Repository(err)) => {
                        report.failures += 1;
                        error!(enquiry_id = %record.id, error = %err, "reminder expiry write failed; will retry");
                        continue;
                    }
                    Err(err) => return Err(err),
                };
            let Some(original_status) = expired_from(&transition) else {
                continue;
            };

            info!(
                enquiry_id = %record.id,
                original_status = %original_status,
                "reminder expired; enquiry returned to pending"
            );
            report.expired.push(record.id.clone());

            let focused = focus.map_or(true, |id| *id == record.id);
            if !focused {
                continue;
            }
            let alert = match delivery {
                AlertDelivery::Viewer => {
                    self.raise_alert(&transition.record, Some(original_status), actor, now)
                }
                AlertDelivery::Unattended => {
                    Some(self.publish_unattended(&transition.record, original_status, now))
                }
            };
            report.alerts.extend(alert);
        }

        debug!(
            examined = report.examined,
            expired = report.expired.len(),
            failures = report.failures,
            "reminder sweep finished"
        );
        Ok(report)
    }

    /// Expiry check run when a record is opened or refreshed.
    pub fn check_on_load(
        &self,
        id: &EnquiryId,
        actor: &Actor,
    ) -> Result<Option<ReminderAlert>, EnquiryServiceError> {
        let mut record = self.get(id)?;
        let now = self.now();

        if record.reminder.as_ref().is_some_and(|schedule| schedule.is_due(now)) {
            let transition = self.transact(id, EnquiryCommand::ExpireReminder, actor, now)?;
            if let Some(original_status) = expired_from(&transition) {
                info!(enquiry_id = %id, "reminder expired on load; enquiry returned to pending");
                return Ok(self.raise_alert(&transition.record, Some(original_status), actor, now));
            }
            record = transition.record;
        }

        let recently_expired = record.status == EnquiryStatus::Pending
            && record.notification.reminder_expired_at.is_some_and(|at| {
                now - at <= Duration::hours(RECENT_EXPIRY_WINDOW_HOURS)
            });
        if recently_expired {
            return Ok(self.raise_alert(&record, None, actor, now));
        }

        Ok(None)
    }

    /// Drop stale per-device markers. Run once when the hosting process starts.
    pub fn prune_markers(&self) -> usize {
        let removed = self.gate.prune(self.now(), self.marker_retention);
        if removed > 0 {
            info!(removed, "pruned stale notification markers");
        }
        removed
    }

    fn raise_alert(
        &self,
        record: &Enquiry,
        original_status: Option<EnquiryStatus>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Option<ReminderAlert> {
        let alert = self.gate.admit(record, original_status, now)?;

        if let Err(err) = self.sink.publish(alert.clone()) {
            warn!(enquiry_id = %record.id, error = %err, "failed to deliver reminder alert");
        }

        if let Err(err) =
            self.transact(&record.id, EnquiryCommand::RecordNotificationShown, actor, now)
        {
            warn!(enquiry_id = %record.id, error = %err, "failed to store notification marker");
        }

        Some(alert)
    }

    fn publish_unattended(
        &self,
        record: &Enquiry,
        original_status: EnquiryStatus,
        now: DateTime<Utc>,
    ) -> ReminderAlert {
        let alert = ReminderAlert::for_record(record, Some(original_status), now);
        if let Err(err) = self.sink.publish(alert.clone()) {
            warn!(enquiry_id = %record.id, error = %err, "failed to deliver reminder alert");
        }
        alert
    }

    /// Apply `command` to the record as currently stored, within a single store update.
    fn transact(
        &self,
        id: &EnquiryId,
        command: EnquiryCommand,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Transition, EnquiryServiceError> {
        let mut outcome = None;
        self.repository.modify(id, |current| {
            let result = apply(current, command, actor, now);
            let write = match &result {
                Ok(transition) if transition.requires_write() => Some(transition.record.clone()),
                _ => None,
            };
            outcome = Some(result);
            write
        })?;

        let transition = outcome.ok_or(RepositoryError::NotFound)??;
        Ok(transition)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AlertDelivery {
    /// Someone sees the alert: dedup applies and both shown markers are stamped.
    Viewer,
    /// Log or feed only.
    Unattended,
}

fn expired_from(transition: &Transition) -> Option<EnquiryStatus> {
    transition.effects.iter().find_map(|effect| match effect {
        LifecycleEffect::ReminderExpired { original_status } => Some(*original_status),
        LifecycleEffect::Persist => None,
    })
}

/// Error raised by the enquiry service.
#[derive(Debug, thiserror::Error)]
pub enum EnquiryServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
