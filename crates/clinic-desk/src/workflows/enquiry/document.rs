//! Store-boundary shape of an enquiry. Exports from the hosted collection use camelCase keys,
//! optional fields everywhere, and mixed timestamp encodings; everything is normalized here so
//! the engine only ever sees [`Enquiry`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use super::domain::{
    Enquiry, EnquiryId, EnquiryStatus, NotificationState, ReminderDuration, ReminderSchedule,
};
use crate::workflows::audit::{AuditStamp, HistoryEntry};
use crate::workflows::timestamp::{normalize, StoreTimestamp};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryDocument {
    pub id: Option<String>,
    pub enquirer_name: Option<String>,
    pub enquirer_mobile: Option<String>,
    pub patient_name: Option<String>,
    pub enquiry_details: Option<String>,
    #[serde(default)]
    pub enquiry_details_history: Vec<HistoryDocument>,
    pub assigned_staff: Option<String>,
    pub assigned_doctor: Option<String>,
    pub assigned_doctor_at: Option<StoreTimestamp>,
    pub doc_remarks: Option<String>,
    pub doc_remarks_at: Option<StoreTimestamp>,
    pub status: Option<String>,
    pub created_at: Option<StoreTimestamp>,
    pub created_by: Option<String>,
    pub created_by_email: Option<String>,
    pub updated_at: Option<StoreTimestamp>,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub reminder_scheduled_at: Option<StoreTimestamp>,
    pub reminder_duration: Option<u32>,
    pub original_status: Option<String>,
    pub pending_since: Option<StoreTimestamp>,
    pub last_notification_shown: Option<StoreTimestamp>,
    pub reminder_expired_at: Option<StoreTimestamp>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDocument {
    #[serde(default)]
    pub text: String,
    pub at: Option<StoreTimestamp>,
    pub by_name: Option<String>,
    pub by_email: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document is missing an id")]
    MissingId,
    #[error("document {id} has unknown status '{status}'")]
    UnknownStatus { id: String, status: String },
    #[error("document {id} has no usable creation time")]
    MissingCreatedAt { id: String },
    #[error("invalid export: {0}")]
    Json(#[from] serde_json::Error),
}

fn parse_status(id: &str, raw: &str) -> Result<EnquiryStatus, DocumentError> {
    EnquiryStatus::parse(raw).ok_or_else(|| DocumentError::UnknownStatus {
        id: id.to_string(),
        status: raw.to_string(),
    })
}

impl EnquiryDocument {
    pub fn into_enquiry(self) -> Result<Enquiry, DocumentError> {
        let id = self
            .id
            .filter(|value| !value.trim().is_empty())
            .ok_or(DocumentError::MissingId)?;

        let status = match self.status.as_deref() {
            Some(raw) => parse_status(&id, raw)?,
            None => EnquiryStatus::Pending,
        };

        let updated_at = normalize(self.updated_at.as_ref());
        let created_at = normalize(self.created_at.as_ref())
            .or(updated_at)
            .ok_or_else(|| DocumentError::MissingCreatedAt { id: id.clone() })?;

        let reminder = reminder_from_parts(
            &id,
            normalize(self.reminder_scheduled_at.as_ref()),
            self.reminder_duration,
            self.original_status.as_deref(),
            status,
        );

        let details_history = self
            .enquiry_details_history
            .into_iter()
            .map(|entry| HistoryEntry {
                text: entry.text,
                at: normalize(entry.at.as_ref()).unwrap_or(created_at),
                by_name: entry.by_name.unwrap_or_default(),
                by_email: entry.by_email.unwrap_or_default(),
            })
            .collect();

        Ok(Enquiry {
            id: EnquiryId(id),
            enquirer_name: self.enquirer_name.unwrap_or_default(),
            enquirer_mobile: self.enquirer_mobile.unwrap_or_default(),
            patient_name: self.patient_name.unwrap_or_default(),
            details: self.enquiry_details,
            details_history,
            assigned_staff: self.assigned_staff,
            assigned_doctor: self.assigned_doctor,
            assigned_doctor_at: normalize(self.assigned_doctor_at.as_ref()),
            doctor_remarks: self.doc_remarks,
            doctor_remarks_at: normalize(self.doc_remarks_at.as_ref()),
            status,
            created_at,
            created_by: self.created_by.unwrap_or_default(),
            created_by_email: self.created_by_email.unwrap_or_default(),
            audit: AuditStamp {
                updated_at: updated_at.unwrap_or(created_at),
                user_id: self.user_id.unwrap_or_default(),
                user_email: self.user_email.unwrap_or_default(),
            },
            reminder,
            notification: NotificationState {
                pending_since: normalize(self.pending_since.as_ref()),
                last_notification_shown: normalize(self.last_notification_shown.as_ref()),
                reminder_expired_at: normalize(self.reminder_expired_at.as_ref()),
            },
        })
    }
}

/// A reminder is only honoured when both halves survived; half-written reminders are dropped.
fn reminder_from_parts(
    id: &str,
    scheduled_at: Option<DateTime<Utc>>,
    duration_hours: Option<u32>,
    original_status: Option<&str>,
    status: EnquiryStatus,
) -> Option<ReminderSchedule> {
    match (scheduled_at, duration_hours) {
        (None, None) => None,
        (Some(scheduled_at), Some(hours)) => {
            let Some(duration) = ReminderDuration::from_hours(hours) else {
                warn!(enquiry_id = id, hours, "dropping reminder with unsupported duration");
                return None;
            };
            let original_status = original_status
                .and_then(EnquiryStatus::parse)
                .unwrap_or(status);
            Some(ReminderSchedule {
                scheduled_at,
                duration,
                original_status,
            })
        }
        _ => {
            warn!(enquiry_id = id, "dropping partially written reminder");
            None
        }
    }
}

/// Parse a JSON array exported from the enquiries collection.
pub fn parse_export(bytes: &[u8]) -> Result<Vec<Enquiry>, DocumentError> {
    let documents: Vec<EnquiryDocument> = serde_json::from_slice(bytes)?;
    documents
        .into_iter()
        .map(EnquiryDocument::into_enquiry)
        .collect()
}
