use super::common::*;
use chrono::Duration;
use std::time::Duration as StdDuration;

use crate::workflows::enquiry::{
    EnquiryStatus, ReminderDuration, ReminderPoller, ViewingSession,
};

async fn wait_for_alerts(h: &Harness, expected: usize) {
    for _ in 0..100 {
        if h.alerts.events().len() >= expected {
            return;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    panic!(
        "expected {expected} alerts, saw {}",
        h.alerts.events().len()
    );
}

#[test]
fn tick_runs_a_single_sweep() {
    let h = harness();
    let record = h.service.create(in_progress_submission(), &staff()).expect("created");
    h.service
        .set_reminder(&record.id, ReminderDuration::OneDay, &staff())
        .expect("reminder");
    let poller = ReminderPoller::new(h.service.clone(), staff());

    let idle = poller.tick().expect("sweep");
    assert_eq!(idle.examined, 1);
    assert!(idle.expired.is_empty());

    h.clock.advance(Duration::hours(24));
    let report = poller.tick().expect("sweep");
    assert_eq!(report.expired, vec![record.id.clone()]);
    assert_eq!(h.alerts.events().len(), 1);
}

#[test]
fn unattended_poller_does_not_mark_alerts_shown() {
    let h = harness();
    let record = h
        .service
        .create(in_progress_submission(), &staff())
        .expect("created");
    h.service
        .set_reminder(&record.id, ReminderDuration::OneDay, &staff())
        .expect("reminder");
    h.clock.advance(Duration::hours(24));

    let poller = ReminderPoller::new(h.service.clone(), staff()).unattended();
    let report = poller.tick().expect("sweep");
    assert_eq!(report.alerts.len(), 1);
    assert!(h
        .service
        .get(&record.id)
        .expect("stored")
        .notification
        .last_notification_shown
        .is_none());
}

#[tokio::test(start_paused = true)]
async fn spawned_poller_sweeps_immediately_and_on_each_period() {
    let h = harness();
    let first = h.service.create(in_progress_submission(), &staff()).expect("first");
    h.service
        .set_reminder(&first.id, ReminderDuration::OneDay, &staff())
        .expect("reminder");
    h.clock.advance(Duration::hours(24));

    let handle = ReminderPoller::new(h.service.clone(), staff()).spawn(StdDuration::from_secs(60));
    wait_for_alerts(&h, 1).await;
    assert_eq!(
        h.service.get(&first.id).expect("stored").status,
        EnquiryStatus::Pending
    );

    let second = h.service.create(in_progress_submission(), &staff()).expect("second");
    h.service
        .set_reminder(&second.id, ReminderDuration::OneDay, &staff())
        .expect("reminder");
    h.clock.advance(Duration::hours(24));

    tokio::time::sleep(StdDuration::from_secs(61)).await;
    wait_for_alerts(&h, 2).await;

    handle.shutdown().await;
    assert_eq!(h.alerts.events().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn viewing_session_reacts_to_record_changes() {
    let h = harness();
    let record = h.service.create(in_progress_submission(), &staff()).expect("created");
    h.service
        .set_reminder(&record.id, ReminderDuration::OneDay, &staff())
        .expect("reminder");

    let session = ViewingSession::open(
        h.service.clone(),
        staff(),
        record.id.clone(),
        StdDuration::from_secs(3600),
    );
    assert_eq!(session.record(), &record.id);
    tokio::time::sleep(StdDuration::from_millis(10)).await;
    assert!(h.alerts.events().is_empty());

    h.clock.advance(Duration::hours(25));
    h.service
        .edit_details(&record.id, "Called back, no answer", &staff())
        .expect("edit");
    wait_for_alerts(&h, 1).await;

    session.close().await;
    let stored = h.service.get(&record.id).expect("stored");
    assert_eq!(stored.status, EnquiryStatus::Pending);
    assert!(stored.reminder.is_none());
    assert_eq!(h.alerts.events().len(), 1, "dedup holds across re-checks");
}

#[tokio::test(start_paused = true)]
async fn viewing_session_expires_due_reminder_on_open() {
    let h = harness();
    let record = h.service.create(in_progress_submission(), &staff()).expect("created");
    h.service
        .set_reminder(&record.id, ReminderDuration::OneDay, &staff())
        .expect("reminder");
    h.clock.advance(Duration::hours(30));

    let session = ViewingSession::open(
        h.service.clone(),
        staff(),
        record.id.clone(),
        StdDuration::from_secs(60),
    );
    wait_for_alerts(&h, 1).await;
    session.close().await;

    let alert = &h.alerts.events()[0];
    assert_eq!(alert.enquiry_id, record.id);
}
