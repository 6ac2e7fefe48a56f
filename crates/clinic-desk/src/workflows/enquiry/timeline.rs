use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Enquiry, EnquiryStatus};
use super::reminder::RemainingTime;
use crate::workflows::audit::label_from_email;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineState {
    Completed,
    Current,
    Upcoming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEvent {
    pub key: String,
    pub title: String,
    pub description: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub state: TimelineState,
}

impl TimelineEvent {
    fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        timestamp: Option<DateTime<Utc>>,
        state: TimelineState,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            description: description.into(),
            timestamp,
            state,
        }
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Chronicle of an enquiry as rendered on its details page.
pub fn timeline(enquiry: &Enquiry, now: DateTime<Utc>) -> Vec<TimelineEvent> {
    let mut events = Vec::new();
    let updated_at = Some(enquiry.audit.updated_at);
    let staff = enquiry.assigned_staff.as_deref();

    events.push(TimelineEvent::new(
        "submitted",
        "Enquiry submitted to reception",
        format!(
            "{} enquired about patient {}",
            or_default(&enquiry.enquirer_name, "Visitor"),
            or_default(&enquiry.patient_name, "N/A")
        ),
        Some(enquiry.created_at),
        TimelineState::Completed,
    ));

    for (index, entry) in enquiry.details_history.iter().enumerate() {
        let by = if entry.by_name.trim().is_empty() {
            label_from_email(Some(&entry.by_email))
        } else {
            entry.by_name.clone()
        };
        events.push(TimelineEvent::new(
            format!("details_{index}"),
            "Enquiry details updated",
            format!("{by}: {}", entry.text),
            Some(entry.at),
            TimelineState::Completed,
        ));
    }

    if let Some(doctor) = enquiry.assigned_doctor.as_deref() {
        events.push(TimelineEvent::new(
            "doctor_assigned",
            "Doctor assigned",
            format!("Assigned to {doctor}"),
            enquiry.assigned_doctor_at,
            TimelineState::Completed,
        ));
    }

    if let Some(remarks) = enquiry.doctor_remarks.as_deref() {
        events.push(TimelineEvent::new(
            "doctor_remarks",
            "Doctor remarks",
            remarks,
            enquiry.doctor_remarks_at,
            TimelineState::Completed,
        ));
    }

    match enquiry.status {
        EnquiryStatus::Pending => events.push(TimelineEvent::new(
            "pending",
            "Enquiry status",
            match staff {
                Some(name) => format!("{name} is reviewing the enquiry"),
                None => "Pending - waiting for staff review".to_string(),
            },
            enquiry.notification.pending_since.or(updated_at),
            TimelineState::Current,
        )),
        EnquiryStatus::InProgress => events.push(TimelineEvent::new(
            "in_progress",
            "Enquiry status",
            match staff {
                Some(name) => format!("{name} is processing the enquiry"),
                None => "In progress - being processed by staff".to_string(),
            },
            updated_at,
            TimelineState::Current,
        )),
        EnquiryStatus::Completed => {
            events.push(TimelineEvent::new(
                "in_progress",
                "Enquiry status",
                match staff {
                    Some(name) => format!("{name} processed the enquiry"),
                    None => "Processed by staff".to_string(),
                },
                updated_at,
                TimelineState::Completed,
            ));
            events.push(TimelineEvent::new(
                "completed",
                "Enquiry completed",
                "Enquiry successfully resolved",
                updated_at,
                TimelineState::Current,
            ));
        }
        EnquiryStatus::Cancelled => events.push(TimelineEvent::new(
            "cancelled",
            "Enquiry status",
            "Cancelled - enquiry was not processed",
            updated_at,
            TimelineState::Current,
        )),
    }

    if let Some(schedule) = &enquiry.reminder {
        let remaining = RemainingTime::until(schedule, now);
        let state = match remaining {
            RemainingTime::Remaining(_) => TimelineState::Current,
            RemainingTime::Expired => TimelineState::Upcoming,
        };
        events.push(TimelineEvent::new(
            "reminder",
            "Reminder set",
            format!(
                "Reminder for {} hours - {remaining}",
                schedule.duration.hours()
            ),
            Some(schedule.scheduled_at),
            state,
        ));
    }

    events
}
