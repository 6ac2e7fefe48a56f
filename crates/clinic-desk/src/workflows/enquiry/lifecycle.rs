//! Pure state machine for enquiry records.
//!
//! `apply` never touches the store: it takes a snapshot, validates the command against the
//! current status, and returns the next snapshot plus the effects the caller must carry out.
//! Rejected commands leave the input untouched.

use chrono::{DateTime, Utc};

use super::domain::{Enquiry, EnquiryStatus, ReminderDuration, ReminderSchedule};
use crate::workflows::audit::{Actor, AuditStamp, HistoryEntry};
use crate::workflows::directory::doctor_label;

/// Staff actions and automatic transitions accepted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnquiryCommand {
    AssignStaff { staff_name: String },
    AssignDoctor { doctor_name: String },
    MarkCompleted,
    Cancel,
    EditDetails { text: String },
    SaveDoctorRemarks { remarks: String },
    SetReminder { duration: ReminderDuration },
    CancelReminder,
    /// Periodic or on-load expiry check.
    ExpireReminder,
    RecordNotificationShown,
}

impl EnquiryCommand {
    pub const fn action(&self) -> &'static str {
        match self {
            EnquiryCommand::AssignStaff { .. } => "assign staff to",
            EnquiryCommand::AssignDoctor { .. } => "assign a doctor to",
            EnquiryCommand::MarkCompleted => "complete",
            EnquiryCommand::Cancel => "cancel",
            EnquiryCommand::EditDetails { .. } => "edit",
            EnquiryCommand::SaveDoctorRemarks { .. } => "add remarks to",
            EnquiryCommand::SetReminder { .. } => "set a reminder on",
            EnquiryCommand::CancelReminder => "cancel the reminder on",
            EnquiryCommand::ExpireReminder => "expire the reminder on",
            EnquiryCommand::RecordNotificationShown => "record a notification on",
        }
    }
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEffect {
    /// The snapshot changed and must be written back.
    Persist,
    /// A reminder lapsed and the record went back to pending.
    ReminderExpired { original_status: EnquiryStatus },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub record: Enquiry,
    pub effects: Vec<LifecycleEffect>,
}

impl Transition {
    fn unchanged(record: &Enquiry) -> Self {
        Self {
            record: record.clone(),
            effects: Vec::new(),
        }
    }

    fn persisted(record: Enquiry) -> Self {
        Self {
            record,
            effects: vec![LifecycleEffect::Persist],
        }
    }

    pub fn requires_write(&self) -> bool {
        self.effects.contains(&LifecycleEffect::Persist)
    }

    pub fn expired(&self) -> bool {
        self.effects
            .iter()
            .any(|effect| matches!(effect, LifecycleEffect::ReminderExpired { .. }))
    }
}

/// Validation failures. Raised before any write is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot {action} an enquiry that is {status}")]
    InvalidTransition {
        action: &'static str,
        status: EnquiryStatus,
    },
    #[error("a reminder is already active on this enquiry")]
    ReminderAlreadyActive,
    #[error("{field} must not be blank")]
    BlankValue { field: &'static str },
}

pub fn apply(
    record: &Enquiry,
    command: EnquiryCommand,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<Transition, LifecycleError> {
    let action = command.action();
    let require_open = |record: &Enquiry| {
        if record.status.is_open() {
            Ok(())
        } else {
            Err(LifecycleError::InvalidTransition {
                action,
                status: record.status,
            })
        }
    };

    let mut next = record.clone();
    match command {
        EnquiryCommand::AssignStaff { staff_name } => {
            require_open(record)?;
            let staff_name = non_blank(staff_name, "staff name")?;
            next.assigned_staff = Some(staff_name);
            next.status = EnquiryStatus::InProgress;
        }
        EnquiryCommand::AssignDoctor { doctor_name } => {
            require_open(record)?;
            let doctor_name = non_blank(doctor_name, "doctor name")?;
            next.assigned_doctor = Some(doctor_label(&doctor_name));
            next.assigned_doctor_at = Some(now);
        }
        EnquiryCommand::MarkCompleted => {
            require_open(record)?;
            next.status = EnquiryStatus::Completed;
        }
        EnquiryCommand::Cancel => {
            require_open(record)?;
            next.status = EnquiryStatus::Cancelled;
        }
        EnquiryCommand::EditDetails { text } => {
            next.details_history
                .push(HistoryEntry::new(text.clone(), actor, now));
            next.details = Some(text);
        }
        EnquiryCommand::SaveDoctorRemarks { remarks } => {
            next.doctor_remarks = Some(remarks);
            next.doctor_remarks_at = Some(now);
        }
        EnquiryCommand::SetReminder { duration } => {
            // Only handled enquiries can be deferred.
            if record.status == EnquiryStatus::Pending {
                return Err(LifecycleError::InvalidTransition {
                    action,
                    status: record.status,
                });
            }
            if record.reminder.is_some() {
                return Err(LifecycleError::ReminderAlreadyActive);
            }
            next.reminder = Some(ReminderSchedule {
                scheduled_at: now,
                duration,
                original_status: record.status,
            });
        }
        EnquiryCommand::CancelReminder => {
            if record.reminder.is_none() {
                return Ok(Transition::unchanged(record));
            }
            next.reminder = None;
        }
        EnquiryCommand::ExpireReminder => {
            let Some(schedule) = record.reminder.as_ref() else {
                return Ok(Transition::unchanged(record));
            };
            if !schedule.is_due(now) {
                return Ok(Transition::unchanged(record));
            }

            next.status = EnquiryStatus::Pending;
            next.reminder = None;
            next.notification.pending_since = Some(now);
            next.notification.reminder_expired_at = Some(now);
            next.notification.last_notification_shown = None;
            next.audit = AuditStamp::new(actor, now);

            return Ok(Transition {
                record: next,
                effects: vec![
                    LifecycleEffect::Persist,
                    LifecycleEffect::ReminderExpired {
                        original_status: schedule.original_status,
                    },
                ],
            });
        }
        EnquiryCommand::RecordNotificationShown => {
            next.notification.last_notification_shown = Some(now);
        }
    }

    if next.status == EnquiryStatus::Pending && record.status != EnquiryStatus::Pending {
        next.notification.pending_since = Some(now);
    }
    next.audit = AuditStamp::new(actor, now);
    Ok(Transition::persisted(next))
}

fn non_blank(value: String, field: &'static str) -> Result<String, LifecycleError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(LifecycleError::BlankValue { field })
    } else {
        Ok(trimmed.to_string())
    }
}
