use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::audit::{Actor, AuditStamp, HistoryEntry};

pub const DEFAULT_VISITOR_NAME: &str = "New Visitor";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisitId(pub String);

impl VisitId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

impl fmt::Display for VisitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    CheckedIn,
    CheckedOut,
}

impl VisitStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VisitStatus::CheckedIn => "checked_in",
            VisitStatus::CheckedOut => "checked_out",
        }
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A visitor's stay at the clinic. The visitor and the front desk check out independently;
/// `check_out_time` mirrors whichever checkout the table last recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: VisitId,
    pub visitor_name: String,
    pub visitor_mobile: String,
    pub patient_name: String,
    pub status: VisitStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub visitor_check_out_time: Option<DateTime<Utc>>,
    pub admin_check_in_time: Option<DateTime<Utc>>,
    pub admin_check_out_time: Option<DateTime<Utc>>,
    pub attended_by: Option<String>,
    pub attended_at: Option<DateTime<Utc>>,
    pub assigned_doctor: Option<String>,
    pub assigned_doctor_at: Option<DateTime<Utc>>,
    pub details: Option<String>,
    pub details_history: Vec<HistoryEntry>,
    pub doctor_remarks: Option<String>,
    pub doctor_remarks_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub audit: AuditStamp,
}

impl Visit {
    /// Day the visit counts towards in dashboards.
    pub fn visited_at(&self) -> DateTime<Utc> {
        self.check_in_time.unwrap_or(self.created_at)
    }
}

/// Walk-in registration from the front desk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVisit {
    #[serde(default)]
    pub visitor_name: String,
    #[serde(default)]
    pub visitor_mobile: String,
    #[serde(default)]
    pub patient_name: String,
}

impl NewVisit {
    pub fn into_visit(self, id: VisitId, actor: &Actor, now: DateTime<Utc>) -> Visit {
        let visitor_name = match self.visitor_name.trim() {
            "" => DEFAULT_VISITOR_NAME.to_string(),
            name => name.to_string(),
        };

        Visit {
            id,
            visitor_name,
            visitor_mobile: self.visitor_mobile.trim().to_string(),
            patient_name: self.patient_name.trim().to_string(),
            status: VisitStatus::CheckedIn,
            check_in_time: Some(now),
            check_out_time: None,
            visitor_check_out_time: None,
            admin_check_in_time: None,
            admin_check_out_time: None,
            attended_by: None,
            attended_at: None,
            assigned_doctor: None,
            assigned_doctor_at: None,
            details: None,
            details_history: Vec::new(),
            doctor_remarks: None,
            doctor_remarks_at: None,
            created_at: now,
            created_by: actor.user_id.clone(),
            audit: AuditStamp::new(actor, now),
        }
    }
}
