use super::common::*;
use chrono::Duration;
use std::sync::Arc;

use crate::workflows::enquiry::notification::marker_key;
use crate::workflows::enquiry::{
    EnquiryId, EnquiryStatus, FileMarkerStore, InMemoryMarkerStore, MarkerStore,
    NotificationGate, NotificationPolicy,
};

#[test]
fn policy_requires_both_markers_outside_the_window() {
    let policy = NotificationPolicy::default();
    let now = opened_at();
    let old = Some(now - Duration::minutes(31));
    let fresh = Some(now - Duration::minutes(10));

    assert!(policy.allows(None, None, now));
    assert!(policy.allows(old, old, now));
    assert!(!policy.allows(fresh, None, now));
    assert!(!policy.allows(None, fresh, now));
    assert!(!policy.allows(old, fresh, now));
}

#[test]
fn policy_window_boundary_is_exclusive() {
    let policy = NotificationPolicy::default();
    let now = opened_at();
    assert!(!policy.allows(Some(now - Duration::minutes(30)), None, now));
    assert!(policy.allows(
        Some(now - Duration::minutes(30) - Duration::seconds(1)),
        None,
        now
    ));
}

#[test]
fn gate_suppresses_repeat_within_window_and_fires_after() {
    let markers = Arc::new(InMemoryMarkerStore::default());
    let gate = NotificationGate::new(NotificationPolicy::default(), markers.clone());
    let record = pending_enquiry();

    let first = gate
        .admit(&record, Some(EnquiryStatus::Completed), opened_at())
        .expect("first alert");
    assert_eq!(first.enquiry_id, record.id);
    assert_eq!(first.original_status, Some(EnquiryStatus::Completed));
    assert_eq!(
        markers.last_shown(&record.id).expect("lookup"),
        Some(opened_at())
    );

    assert!(gate
        .admit(&record, None, opened_at() + Duration::minutes(29))
        .is_none());
    assert!(gate
        .admit(&record, None, opened_at() + Duration::minutes(31))
        .is_some());
}

#[test]
fn stored_marker_suppresses_alerts_on_a_fresh_device() {
    let gate = NotificationGate::new(
        NotificationPolicy::default(),
        Arc::new(InMemoryMarkerStore::default()),
    );
    let mut record = pending_enquiry();
    record.notification.last_notification_shown = Some(opened_at());

    assert!(gate
        .admit(&record, None, opened_at() + Duration::minutes(5))
        .is_none());
}

#[test]
fn custom_window_is_honoured() {
    let gate = NotificationGate::new(
        NotificationPolicy::new(Duration::minutes(5)),
        Arc::new(InMemoryMarkerStore::default()),
    );
    let record = pending_enquiry();
    assert!(gate.admit(&record, None, opened_at()).is_some());
    assert!(gate
        .admit(&record, None, opened_at() + Duration::minutes(6))
        .is_some());
}

#[test]
fn pruning_drops_markers_past_retention() {
    let markers = Arc::new(InMemoryMarkerStore::default());
    let stale = EnquiryId("stale".to_string());
    let recent = EnquiryId("recent".to_string());
    markers
        .mark_shown(&stale, opened_at() - Duration::days(8))
        .expect("mark");
    markers
        .mark_shown(&recent, opened_at() - Duration::days(1))
        .expect("mark");

    let gate = NotificationGate::new(NotificationPolicy::default(), markers.clone());
    assert_eq!(gate.prune(opened_at(), Duration::days(7)), 1);
    assert_eq!(markers.len(), 1);
    assert!(markers.last_shown(&stale).expect("lookup").is_none());
    assert!(markers.last_shown(&recent).expect("lookup").is_some());
}

#[test]
fn marker_keys_use_last_shown_prefix() {
    assert_eq!(marker_key(&EnquiryId("abc".to_string())), "lastShown:abc");
}

#[test]
fn file_markers_survive_reopen() {
    let path = std::env::temp_dir().join(format!(
        "clinic-desk-markers-{}.json",
        EnquiryId::generate()
    ));
    let id = EnquiryId("enq-9".to_string());

    {
        let markers = FileMarkerStore::open(&path).expect("open new file");
        markers.mark_shown(&id, opened_at()).expect("mark");
    }

    let reopened = FileMarkerStore::open(&path).expect("reopen");
    assert_eq!(reopened.last_shown(&id).expect("lookup"), Some(opened_at()));

    let raw = std::fs::read_to_string(&path).expect("read file");
    let parsed: serde_json::Value = serde_json::from_str(&raw).expect("json object");
    assert_eq!(
        parsed["lastShown:enq-9"].as_i64(),
        Some(opened_at().timestamp_millis())
    );

    std::fs::remove_file(&path).ok();
}
