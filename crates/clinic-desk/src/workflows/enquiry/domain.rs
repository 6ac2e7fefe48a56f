use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::audit::{Actor, AuditStamp, HistoryEntry};

/// Identifier wrapper for enquiry documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnquiryId(pub String);

impl EnquiryId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnquiryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status tracked throughout the enquiry lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnquiryStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl EnquiryStatus {
    pub const ALL: [EnquiryStatus; 4] = [
        EnquiryStatus::Pending,
        EnquiryStatus::InProgress,
        EnquiryStatus::Completed,
        EnquiryStatus::Cancelled,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            EnquiryStatus::Pending => "pending",
            EnquiryStatus::InProgress => "in_progress",
            EnquiryStatus::Completed => "completed",
            EnquiryStatus::Cancelled => "cancelled",
        }
    }

    /// Open enquiries still accept assignment and closing actions.
    pub const fn is_open(self) -> bool {
        matches!(self, EnquiryStatus::Pending | EnquiryStatus::InProgress)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for EnquiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Deferral lengths offered to staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ReminderDuration {
    OneDay,
    ThreeDays,
    FiveDays,
}

impl ReminderDuration {
    pub const fn hours(self) -> u32 {
        match self {
            ReminderDuration::OneDay => 24,
            ReminderDuration::ThreeDays => 72,
            ReminderDuration::FiveDays => 120,
        }
    }

    pub fn as_duration(self) -> Duration {
        Duration::hours(i64::from(self.hours()))
    }

    pub fn from_hours(hours: u32) -> Option<Self> {
        match hours {
            24 => Some(ReminderDuration::OneDay),
            72 => Some(ReminderDuration::ThreeDays),
            120 => Some(ReminderDuration::FiveDays),
            _ => None,
        }
    }
}

impl TryFrom<u32> for ReminderDuration {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_hours(value)
            .ok_or_else(|| format!("reminder duration must be 24, 72 or 120 hours, got {value}"))
    }
}

impl From<ReminderDuration> for u32 {
    fn from(value: ReminderDuration) -> Self {
        value.hours()
    }
}

/// Active deferral. Held as a single optional value on the record so a reminder is either
/// fully scheduled or absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSchedule {
    pub scheduled_at: DateTime<Utc>,
    pub duration: ReminderDuration,
    pub original_status: EnquiryStatus,
}

impl ReminderSchedule {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.scheduled_at + self.duration.as_duration()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// Markers driving the one-time "returned to pending" alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationState {
    pub pending_since: Option<DateTime<Utc>>,
    pub last_notification_shown: Option<DateTime<Utc>>,
    /// Set when a reminder expiry moved the record back to pending.
    pub reminder_expired_at: Option<DateTime<Utc>>,
}

/// Enquiry document as handled by the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enquiry {
    pub id: EnquiryId,
    pub enquirer_name: String,
    pub enquirer_mobile: String,
    pub patient_name: String,
    pub details: Option<String>,
    pub details_history: Vec<HistoryEntry>,
    pub assigned_staff: Option<String>,
    pub assigned_doctor: Option<String>,
    pub assigned_doctor_at: Option<DateTime<Utc>>,
    pub doctor_remarks: Option<String>,
    pub doctor_remarks_at: Option<DateTime<Utc>>,
    pub status: EnquiryStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub created_by_email: String,
    pub audit: AuditStamp,
    pub reminder: Option<ReminderSchedule>,
    pub notification: NotificationState,
}

impl Enquiry {
    pub fn has_active_reminder(&self) -> bool {
        self.reminder.is_some()
    }
}

/// Front-desk submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEnquiry {
    pub enquirer_name: String,
    pub enquirer_mobile: String,
    #[serde(default)]
    pub patient_name: String,
    /// E-mail of the staff member who took the enquiry, or `none`.
    pub created_by: String,
    #[serde(default = "default_initial_status")]
    pub status: EnquiryStatus,
}

fn default_initial_status() -> EnquiryStatus {
    EnquiryStatus::Pending
}

pub const MOBILE_PREFIX: &str = "+91 ";

/// Intake rejections surfaced to the submitting user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("enquirer name is required")]
    MissingEnquirerName,
    #[error("mobile number must be '+91 ' followed by 10 digits")]
    InvalidMobile,
    #[error("created-by must be a valid e-mail address or 'none'")]
    InvalidCreatedBy,
}

impl NewEnquiry {
    pub fn validate(&self) -> Result<(), IntakeError> {
        if self.enquirer_name.trim().is_empty() {
            return Err(IntakeError::MissingEnquirerName);
        }

        let digits = self.enquirer_mobile.strip_prefix(MOBILE_PREFIX);
        let mobile_ok = self.enquirer_mobile.len() == MOBILE_PREFIX.len() + 10
            && digits.is_some_and(|rest| rest.chars().all(|ch| ch.is_ascii_digit()));
        if !mobile_ok {
            return Err(IntakeError::InvalidMobile);
        }

        let created_by = self.created_by.trim();
        let is_none = created_by.eq_ignore_ascii_case("none");
        let looks_like_email = created_by.contains('@') && created_by.contains('.');
        if created_by.is_empty() || (!is_none && !looks_like_email) {
            return Err(IntakeError::InvalidCreatedBy);
        }

        Ok(())
    }

    /// Build the stored record. Callers validate first.
    pub fn into_enquiry(self, id: EnquiryId, actor: &Actor, now: DateTime<Utc>) -> Enquiry {
        let created_by = self.created_by.trim();
        let created_by_email = if created_by.eq_ignore_ascii_case("none") {
            "None".to_string()
        } else {
            created_by.to_string()
        };
        let pending_since = (self.status == EnquiryStatus::Pending).then_some(now);

        Enquiry {
            id,
            enquirer_name: self.enquirer_name.trim().to_string(),
            enquirer_mobile: self.enquirer_mobile,
            patient_name: self.patient_name.trim().to_string(),
            details: None,
            details_history: Vec::new(),
            assigned_staff: None,
            assigned_doctor: None,
            assigned_doctor_at: None,
            doctor_remarks: None,
            doctor_remarks_at: None,
            status: self.status,
            created_at: now,
            created_by: actor.user_id.clone(),
            created_by_email,
            audit: AuditStamp::new(actor, now),
            reminder: None,
            notification: NotificationState {
                pending_since,
                ..NotificationState::default()
            },
        }
    }
}
