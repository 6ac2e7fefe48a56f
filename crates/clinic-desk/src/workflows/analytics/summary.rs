use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate, Timelike};

use super::views::{
    AnalyticsSummary, DailyActivity, HourlyLoad, RecentPatient, StatusCount, VisitorFrequency,
};
use crate::workflows::enquiry::{Enquiry, EnquiryStatus};
use crate::workflows::visit::{Visit, VisitStatus};

const WEEK_DAYS: i64 = 7;
const RECENT_PATIENTS: usize = 5;
const FREQUENT_VISITORS: usize = 5;
const PEAK_HOURS: usize = 6;

impl AnalyticsSummary {
    /// Aggregate the dashboard from full snapshots of both collections. `today` closes the
    /// seven-day window.
    pub fn build(visits: &[Visit], enquiries: &[Enquiry], today: NaiveDate) -> Self {
        let visit_status = [VisitStatus::CheckedIn, VisitStatus::CheckedOut]
            .into_iter()
            .map(|status| StatusCount {
                status: status.label(),
                count: visits.iter().filter(|visit| visit.status == status).count(),
            })
            .collect();

        let enquiry_status = EnquiryStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status: status.label(),
                count: enquiries
                    .iter()
                    .filter(|enquiry| enquiry.status == status)
                    .count(),
            })
            .collect();

        let pending_enquiries = enquiries
            .iter()
            .filter(|enquiry| enquiry.status == EnquiryStatus::Pending)
            .count();

        Self {
            total_visits: visits.len(),
            total_enquiries: enquiries.len(),
            pending_enquiries,
            visit_status,
            enquiry_status,
            weekly: weekly_activity(visits, enquiries, today),
            last_visited_patients: last_visited_patients(visits),
            frequent_visitors: frequent_visitors(visits),
            peak_hours: peak_hours(visits),
        }
    }
}

fn weekly_activity(visits: &[Visit], enquiries: &[Enquiry], today: NaiveDate) -> Vec<DailyActivity> {
    (0..WEEK_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            DailyActivity {
                date,
                day: date.format("%a").to_string(),
                visits: visits
                    .iter()
                    .filter(|visit| visit.visited_at().date_naive() == date)
                    .count(),
                enquiries: enquiries
                    .iter()
                    .filter(|enquiry| enquiry.created_at.date_naive() == date)
                    .count(),
            }
        })
        .collect()
}

fn last_visited_patients(visits: &[Visit]) -> Vec<RecentPatient> {
    let mut recent: Vec<&Visit> = visits
        .iter()
        .filter(|visit| !visit.patient_name.trim().is_empty())
        .collect();
    recent.sort_by(|a, b| b.visited_at().cmp(&a.visited_at()));

    let mut seen = HashSet::new();
    recent
        .into_iter()
        .filter(|visit| seen.insert(visit.patient_name.trim().to_string()))
        .take(RECENT_PATIENTS)
        .map(|visit| RecentPatient {
            name: visit.patient_name.trim().to_string(),
            visited_on: visit.visited_at().date_naive(),
        })
        .collect()
}

/// Highest counts first; ties by name so the ranking is stable.
fn ranked<K: Ord + Clone>(counts: HashMap<K, usize>, limit: usize) -> Vec<(K, usize)> {
    let mut entries: Vec<(K, usize)> = counts.into_iter().collect();
    entries.sort_by(|(key_a, count_a), (key_b, count_b)| {
        count_b.cmp(count_a).then_with(|| key_a.cmp(key_b))
    });
    entries.truncate(limit);
    entries
}

fn frequent_visitors(visits: &[Visit]) -> Vec<VisitorFrequency> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for visit in visits {
        let name = visit.visitor_name.trim();
        if !name.is_empty() {
            *counts.entry(name.to_string()).or_default() += 1;
        }
    }

    ranked(counts, FREQUENT_VISITORS)
        .into_iter()
        .map(|(name, count)| VisitorFrequency { name, count })
        .collect()
}

fn peak_hours(visits: &[Visit]) -> Vec<HourlyLoad> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for check_in in visits.iter().filter_map(|visit| visit.check_in_time) {
        *counts.entry(check_in.hour()).or_default() += 1;
    }

    ranked(counts, PEAK_HOURS)
        .into_iter()
        .map(|(hour, count)| HourlyLoad {
            hour,
            label: format!("{hour}:00"),
            count,
        })
        .collect()
}
