use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    /// Short weekday name, e.g. `Mon`.
    pub day: String,
    pub visits: usize,
    pub enquiries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentPatient {
    pub name: String,
    pub visited_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitorFrequency {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyLoad {
    pub hour: u32,
    pub label: String,
    pub count: usize,
}

/// Dashboard payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsSummary {
    pub total_visits: usize,
    pub total_enquiries: usize,
    pub pending_enquiries: usize,
    pub visit_status: Vec<StatusCount>,
    pub enquiry_status: Vec<StatusCount>,
    pub weekly: Vec<DailyActivity>,
    pub last_visited_patients: Vec<RecentPatient>,
    pub frequent_visitors: Vec<VisitorFrequency>,
    pub peak_hours: Vec<HourlyLoad>,
}
