use chrono::{DateTime, Utc};

use super::domain::{Visit, VisitStatus};
use crate::workflows::audit::{Actor, AuditStamp, HistoryEntry};
use crate::workflows::directory::doctor_label;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitCommand {
    /// Front-desk checkout from the details page.
    AdminCheckOut,
    /// Undo of an admin checkout.
    AdminCheckIn,
    /// Quick flip from the visits table.
    ToggleStatus,
    AssignStaff { staff_name: String },
    AssignDoctor { doctor_name: String },
    EditDetails { text: String },
    SaveDoctorRemarks { remarks: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VisitLifecycleError {
    #[error("visit has already been checked out by the front desk")]
    AlreadyCheckedOut,
    #[error("visit has not been checked out by the front desk")]
    NotCheckedOut,
    #[error("{field} must not be blank")]
    BlankValue { field: &'static str },
}

pub fn apply(
    visit: &Visit,
    command: VisitCommand,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<Visit, VisitLifecycleError> {
    let mut next = visit.clone();

    match command {
        VisitCommand::AdminCheckOut => {
            if visit.admin_check_out_time.is_some() {
                return Err(VisitLifecycleError::AlreadyCheckedOut);
            }
            next.admin_check_out_time = Some(now);
            if next.visitor_check_out_time.is_none() {
                next.visitor_check_out_time = Some(now);
            }
            next.status = VisitStatus::CheckedOut;
            next.check_out_time = Some(now);
        }
        VisitCommand::AdminCheckIn => {
            if visit.admin_check_out_time.is_none() {
                return Err(VisitLifecycleError::NotCheckedOut);
            }
            next.admin_check_in_time = Some(now);
            next.admin_check_out_time = None;
            next.check_out_time = None;
            // A visitor who left on their own stays checked out.
            if visit.visitor_check_out_time.is_none() {
                next.status = VisitStatus::CheckedIn;
            }
        }
        VisitCommand::ToggleStatus => match visit.status {
            VisitStatus::CheckedIn => {
                next.status = VisitStatus::CheckedOut;
                next.check_out_time = Some(now);
            }
            VisitStatus::CheckedOut => {
                next.status = VisitStatus::CheckedIn;
                next.check_out_time = None;
            }
        },
        VisitCommand::AssignStaff { staff_name } => {
            let staff_name = non_blank(&staff_name, "staff name")?;
            next.attended_by = Some(staff_name);
            next.attended_at = Some(now);
        }
        VisitCommand::AssignDoctor { doctor_name } => {
            let doctor_name = non_blank(&doctor_name, "doctor name")?;
            next.assigned_doctor = Some(doctor_label(&doctor_name));
            next.assigned_doctor_at = Some(now);
        }
        VisitCommand::EditDetails { text } => {
            next.details_history
                .push(HistoryEntry::new(text.clone(), actor, now));
            next.details = Some(text);
        }
        VisitCommand::SaveDoctorRemarks { remarks } => {
            next.doctor_remarks = Some(remarks);
            next.doctor_remarks_at = Some(now);
        }
    }

    next.audit = AuditStamp::new(actor, now);
    Ok(next)
}

fn non_blank(value: &str, field: &'static str) -> Result<String, VisitLifecycleError> {
    match value.trim() {
        "" => Err(VisitLifecycleError::BlankValue { field }),
        trimmed => Ok(trimmed.to_string()),
    }
}
