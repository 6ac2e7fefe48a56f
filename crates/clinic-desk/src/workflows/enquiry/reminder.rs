use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::domain::{Enquiry, ReminderSchedule};

/// Time left on a reminder as shown next to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingTime {
    Remaining(Duration),
    /// Past expiry but not yet processed by a poll.
    Expired,
}

impl RemainingTime {
    pub fn until(schedule: &ReminderSchedule, now: DateTime<Utc>) -> Self {
        let left = schedule.expires_at() - now;
        if left > Duration::zero() {
            RemainingTime::Remaining(left)
        } else {
            RemainingTime::Expired
        }
    }
}

impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemainingTime::Expired => f.write_str("expired, will reset soon"),
            RemainingTime::Remaining(left) => {
                let days = left.num_days();
                let hours = left.num_hours() % 24;
                let minutes = left.num_minutes() % 60;
                if days > 0 {
                    write!(f, "Time remaining: {days}d {hours}h")
                } else if hours > 0 {
                    write!(f, "Time remaining: {hours}h {minutes}m")
                } else {
                    write!(f, "Time remaining: {minutes}m")
                }
            }
        }
    }
}

/// Serializable reminder summary for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderStatusView {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<String>,
}

impl ReminderStatusView {
    pub fn for_enquiry(enquiry: &Enquiry, now: DateTime<Utc>) -> Self {
        match &enquiry.reminder {
            Some(schedule) => Self {
                active: true,
                duration_hours: Some(schedule.duration.hours()),
                scheduled_at: Some(schedule.scheduled_at),
                expires_at: Some(schedule.expires_at()),
                original_status: Some(schedule.original_status.label()),
                remaining: Some(RemainingTime::until(schedule, now).to_string()),
            },
            None => Self {
                active: false,
                duration_hours: None,
                scheduled_at: None,
                expires_at: None,
                original_status: None,
                remaining: None,
            },
        }
    }
}
