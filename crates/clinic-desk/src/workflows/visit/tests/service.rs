use super::common::*;
use chrono::Duration;

use crate::store::RepositoryError;
use crate::workflows::visit::{
    NewVisit, VisitId, VisitLifecycleError, VisitRepository, VisitServiceError, VisitStatus,
};

#[test]
fn register_stores_a_checked_in_visit() {
    let (service, store, _) = build_service();
    let visit = service.register(walk_in(), &receptionist()).expect("registered");

    let stored = store.fetch(&visit.id).expect("fetch").expect("present");
    assert_eq!(stored.status, VisitStatus::CheckedIn);
    assert_eq!(stored.visitor_name, "Ravi Kumar");
}

#[test]
fn register_fills_placeholder_name() {
    let (service, _, _) = build_service();
    let visit = service
        .register(NewVisit::default(), &receptionist())
        .expect("registered");
    assert_eq!(visit.visitor_name, "New Visitor");
}

#[test]
fn checkout_uses_the_service_clock() {
    let (service, _, clock) = build_service();
    let visit = service.register(walk_in(), &receptionist()).expect("registered");

    clock.advance(Duration::minutes(50));
    let visit = service
        .admin_check_out(&visit.id, &receptionist())
        .expect("checkout");
    assert_eq!(visit.admin_check_out_time, Some(opened_at() + Duration::minutes(50)));
}

#[test]
fn rejected_commands_do_not_write() {
    let (service, store, _) = build_service();
    let visit = service.register(walk_in(), &receptionist()).expect("registered");

    match service.admin_check_in(&visit.id, &receptionist()) {
        Err(VisitServiceError::Lifecycle(VisitLifecycleError::NotCheckedOut)) => {}
        other => panic!("expected rejection, got {other:?}"),
    }
    let stored = store.fetch(&visit.id).expect("fetch").expect("present");
    assert_eq!(stored, visit);
}

#[test]
fn concurrent_detail_edits_all_land() {
    let (service, _, _) = build_service();
    let visit = service.register(walk_in(), &receptionist()).expect("registered");

    std::thread::scope(|scope| {
        for desk in 0..4 {
            let service = &service;
            let id = visit.id.clone();
            scope.spawn(move || {
                for note in 0..20 {
                    service
                        .edit_details(&id, format!("desk {desk} note {note}"), &receptionist())
                        .expect("edit");
                }
            });
        }
    });

    let stored = service.get(&visit.id).expect("stored");
    assert_eq!(stored.details_history.len(), 80);
}

#[test]
fn unknown_visits_are_not_found() {
    let (service, _, _) = build_service();
    match service.toggle_status(&VisitId("missing".to_string()), &receptionist()) {
        Err(VisitServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn list_orders_by_latest_check_in() {
    let (service, _, clock) = build_service();
    let first = service.register(walk_in(), &receptionist()).expect("first");
    clock.advance(Duration::hours(2));
    let second = service.register(walk_in(), &receptionist()).expect("second");

    let ids: Vec<VisitId> = service
        .list()
        .expect("list")
        .into_iter()
        .map(|visit| visit.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[test]
fn delete_removes_the_visit() {
    let (service, store, _) = build_service();
    let visit = service.register(walk_in(), &receptionist()).expect("registered");
    service.delete(&visit.id).expect("deleted");
    assert!(store.fetch(&visit.id).expect("fetch").is_none());
    assert!(service.delete(&visit.id).is_err());
}
