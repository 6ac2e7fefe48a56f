use crate::infra::{system_actor, Services};
use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::Args;
use clinic_desk::clock::{Clock, ManualClock, SystemClock};
use clinic_desk::config::ReminderConfig;
use clinic_desk::error::AppError;
use clinic_desk::workflows::analytics::AnalyticsSummary;
use clinic_desk::workflows::audit::Actor;
use clinic_desk::workflows::enquiry::{
    EnquiryQuery, EnquiryStatus, NewEnquiry, ReminderDuration, SweepReport,
};
use clinic_desk::workflows::visit::NewVisit;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Simulated start time (RFC 3339). Defaults to 09:30 UTC today.
    #[arg(long, value_parser = crate::infra::parse_timestamp)]
    pub(crate) start: Option<DateTime<Utc>>,
    /// Skip the visitor check-in and analytics portion of the demo.
    #[arg(long)]
    pub(crate) skip_visits: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SweepArgs {
    /// JSON export of enquiry documents
    #[arg(long)]
    pub(crate) seed: PathBuf,
    /// Evaluate expiry as of this instant (RFC 3339) instead of now
    #[arg(long, value_parser = crate::infra::parse_timestamp)]
    pub(crate) at: Option<DateTime<Utc>>,
    /// Print the sweep report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_reminder_sweep(args: SweepArgs) -> Result<(), AppError> {
    let SweepArgs { seed, at, json } = args;

    let clock: Arc<dyn Clock> = match at {
        Some(at) => Arc::new(ManualClock::new(at)),
        None => Arc::new(SystemClock),
    };
    let services = Services::build(&ReminderConfig::default(), clock)?;
    let loaded = services.seed_from(&seed)?;
    let report = services
        .enquiries
        .sweep_expired_reminders(None, &system_actor())?;

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(body) => println!("{body}"),
            Err(err) => println!("Sweep report unavailable: {err}"),
        }
        return Ok(());
    }

    println!(
        "Reminder sweep at {} over {} enquiries",
        services.enquiries.now().to_rfc3339(),
        loaded
    );
    render_sweep(&report);
    Ok(())
}

fn render_sweep(report: &SweepReport) {
    println!(
        "- {} active reminders examined | {} expired | {} failures",
        report.examined,
        report.expired.len(),
        report.failures
    );
    for alert in &report.alerts {
        let from = alert
            .original_status
            .map(|status| status.label())
            .unwrap_or("unknown");
        println!(
            "  - {} ({}) returned to pending from {}",
            alert.enquiry_id, alert.patient_name, from
        );
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { start, skip_visits } = args;

    let start = start.unwrap_or_else(default_start);
    let clock = ManualClock::new(start);
    let services = Services::build(&ReminderConfig::default(), Arc::new(clock.clone()))?;
    let desk = Actor::new("uid-front-desk")
        .with_email("front.desk@clinic.in")
        .with_name("Front Desk");

    println!("Clinic desk demo starting {}", start.to_rfc3339());

    let enquiry = services.enquiries.create(
        NewEnquiry {
            enquirer_name: "Suresh Menon".to_string(),
            enquirer_mobile: "+91 9845012345".to_string(),
            patient_name: "Anita Menon".to_string(),
            created_by: "front.desk@clinic.in".to_string(),
            status: EnquiryStatus::Pending,
        },
        &desk,
    )?;
    println!(
        "- Enquiry {} from {} -> {}",
        enquiry.id, enquiry.enquirer_name, enquiry.status
    );

    let enquiry = services
        .enquiries
        .assign_staff(&enquiry.id, "Asha Rao", &desk)?;
    println!(
        "- Assigned to {} -> {}",
        enquiry.assigned_staff.as_deref().unwrap_or("-"),
        enquiry.status
    );

    services
        .enquiries
        .set_reminder(&enquiry.id, ReminderDuration::OneDay, &desk)?;
    let view = services.enquiries.reminder_status(&enquiry.id)?;
    println!(
        "- Reminder set for {}h ({})",
        view.duration_hours.unwrap_or_default(),
        view.remaining.as_deref().unwrap_or("-")
    );

    let poller_actor = system_actor();
    clock.advance(Duration::hours(23));
    let report = services
        .enquiries
        .sweep_expired_reminders(None, &poller_actor)?;
    let view = services.enquiries.reminder_status(&enquiry.id)?;
    println!(
        "\n+23h poll: {} expired, {}",
        report.expired.len(),
        view.remaining.as_deref().unwrap_or("no reminder")
    );

    clock.advance(Duration::hours(1));
    let report = services
        .enquiries
        .sweep_expired_reminders(None, &poller_actor)?;
    println!("+24h poll:");
    render_sweep(&report);

    clock.advance(Duration::minutes(10));
    let again = services.enquiries.check_on_load(&enquiry.id, &desk)?;
    println!(
        "+24h10m record opened: {}",
        if again.is_some() {
            "alert shown"
        } else {
            "alert suppressed (shown within the last 30 minutes)"
        }
    );

    clock.advance(Duration::minutes(31));
    let later = services.enquiries.check_on_load(&enquiry.id, &desk)?;
    println!(
        "+24h41m record opened: {}",
        if later.is_some() {
            "alert shown again"
        } else {
            "alert suppressed"
        }
    );

    println!("\nTimeline");
    for event in services.enquiries.timeline(&enquiry.id)? {
        let at = event
            .timestamp
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!("  - [{:?}] {} ({}) {}", event.state, event.title, at, event.description);
    }

    if skip_visits {
        return Ok(());
    }

    println!("\nVisitor desk");
    let visit = services.visits.register(
        NewVisit {
            visitor_name: "Ramesh Iyer".to_string(),
            visitor_mobile: "+91 9000012345".to_string(),
            patient_name: "Lakshmi Iyer".to_string(),
        },
        &desk,
    )?;
    println!("- {} checked in -> {}", visit.visitor_name, visit.status.label());
    clock.advance(Duration::minutes(45));
    let visit = services.visits.admin_check_out(&visit.id, &desk)?;
    println!("- {} checked out -> {}", visit.visitor_name, visit.status.label());

    let summary = AnalyticsSummary::build(
        &services.visits.list()?,
        &services.enquiries.list(&EnquiryQuery::default())?,
        clock.now().date_naive(),
    );
    println!(
        "\nToday: {} visits | {} enquiries | {} pending",
        summary.total_visits, summary.total_enquiries, summary.pending_enquiries
    );
    for hour in &summary.peak_hours {
        println!("  - {}: {} check-ins", hour.label, hour.count);
    }

    Ok(())
}

fn default_start() -> DateTime<Utc> {
    let today = Utc::now().date_naive();
    Utc.from_utc_datetime(&today.and_hms_opt(9, 30, 0).unwrap_or_default())
}
