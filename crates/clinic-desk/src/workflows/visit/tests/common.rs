use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::clock::ManualClock;
use crate::store::MemoryVisitStore;
use crate::workflows::audit::Actor;
use crate::workflows::visit::{NewVisit, Visit, VisitId, VisitService};

pub(super) fn opened_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 10, 15, 0)
        .single()
        .expect("valid time")
}

pub(super) fn receptionist() -> Actor {
    Actor::new("uid-reception")
        .with_email("front.desk@clinic.in")
        .with_name("Front Desk")
}

pub(super) fn walk_in() -> NewVisit {
    NewVisit {
        visitor_name: "Ravi Kumar".to_string(),
        visitor_mobile: "+91 9876543210".to_string(),
        patient_name: "Lakshmi Kumar".to_string(),
    }
}

pub(super) fn checked_in_visit() -> Visit {
    walk_in().into_visit(VisitId("visit-1".to_string()), &receptionist(), opened_at())
}

pub(super) fn build_service() -> (
    VisitService<MemoryVisitStore>,
    Arc<MemoryVisitStore>,
    ManualClock,
) {
    let store = Arc::new(MemoryVisitStore::default());
    let clock = ManualClock::new(opened_at());
    let service = VisitService::new(store.clone(), Arc::new(clock.clone()));
    (service, store, clock)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
