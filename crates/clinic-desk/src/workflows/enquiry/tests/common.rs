use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::clock::ManualClock;
use crate::store::{MemoryEnquiryStore, RepositoryError};
use crate::workflows::audit::Actor;
use crate::workflows::enquiry::{
    Enquiry, EnquiryId, EnquiryQuery, EnquiryRepository, EnquiryService, EnquiryStatus,
    InMemoryMarkerStore, NewEnquiry, NotificationError, NotificationPolicy, NotificationSink,
    RecordChange, ReminderAlert,
};

pub(super) fn opened_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 9, 30, 0)
        .single()
        .expect("valid time")
}

pub(super) fn staff() -> Actor {
    Actor::new("uid-priya")
        .with_email("priya.s@clinic.in")
        .with_name("Priya S")
}

pub(super) fn submission() -> NewEnquiry {
    NewEnquiry {
        enquirer_name: "Suresh Menon".to_string(),
        enquirer_mobile: "+91 9845012345".to_string(),
        patient_name: "Anita Menon".to_string(),
        created_by: "priya.s@clinic.in".to_string(),
        status: EnquiryStatus::Pending,
    }
}

/// Submission a staff member files while already handling the enquiry.
pub(super) fn in_progress_submission() -> NewEnquiry {
    NewEnquiry {
        status: EnquiryStatus::InProgress,
        ..submission()
    }
}

/// Pending enquiry as stored right after intake.
pub(super) fn pending_enquiry() -> Enquiry {
    submission().into_enquiry(EnquiryId("enq-1".to_string()), &staff(), opened_at())
}

pub(super) fn enquiry_in(status: EnquiryStatus) -> Enquiry {
    let mut record = pending_enquiry();
    record.status = status;
    record
}

#[derive(Default, Clone)]
pub(super) struct MemoryAlerts {
    events: Arc<Mutex<Vec<ReminderAlert>>>,
}

impl MemoryAlerts {
    pub(super) fn events(&self) -> Vec<ReminderAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl NotificationSink for MemoryAlerts {
    fn publish(&self, alert: ReminderAlert) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("alert mutex poisoned")
            .push(alert);
        Ok(())
    }
}

pub(super) struct FailingSink;

impl NotificationSink for FailingSink {
    fn publish(&self, _alert: ReminderAlert) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("socket closed".to_string()))
    }
}

pub(super) type TestService = EnquiryService<MemoryEnquiryStore, InMemoryMarkerStore, MemoryAlerts>;

pub(super) struct Harness {
    pub(super) service: Arc<TestService>,
    pub(super) store: Arc<MemoryEnquiryStore>,
    pub(super) markers: Arc<InMemoryMarkerStore>,
    pub(super) alerts: Arc<MemoryAlerts>,
    pub(super) clock: ManualClock,
}

pub(super) fn harness() -> Harness {
    harness_with_markers(Arc::new(InMemoryMarkerStore::default()))
}

/// Second device sharing the same record store but with its own local markers.
pub(super) fn harness_with_markers(markers: Arc<InMemoryMarkerStore>) -> Harness {
    let store = Arc::new(MemoryEnquiryStore::default());
    let alerts = Arc::new(MemoryAlerts::default());
    let clock = ManualClock::new(opened_at());
    let service = EnquiryService::new(
        store.clone(),
        markers.clone(),
        alerts.clone(),
        Arc::new(clock.clone()),
        NotificationPolicy::default(),
    );
    Harness {
        service: Arc::new(service),
        store,
        markers,
        alerts,
        clock,
    }
}

/// Store whose writes fail while reads keep working.
pub(super) struct ReadOnlyStore {
    pub(super) inner: MemoryEnquiryStore,
}

impl ReadOnlyStore {
    pub(super) fn with(records: Vec<Enquiry>) -> Self {
        let inner = MemoryEnquiryStore::default();
        inner.seed(records);
        Self { inner }
    }
}

impl EnquiryRepository for ReadOnlyStore {
    fn insert(&self, _record: Enquiry) -> Result<Enquiry, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn update(&self, _record: Enquiry) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn modify<F>(&self, id: &EnquiryId, change: F) -> Result<Option<Enquiry>, RepositoryError>
    where
        F: FnOnce(&Enquiry) -> Option<Enquiry>,
    {
        let current = self.inner.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        match change(&current) {
            Some(_) => Err(RepositoryError::Unavailable("read only".to_string())),
            None => Ok(None),
        }
    }

    fn fetch(&self, id: &EnquiryId) -> Result<Option<Enquiry>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn delete(&self, _id: &EnquiryId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn list(&self, query: &EnquiryQuery) -> Result<Vec<Enquiry>, RepositoryError> {
        self.inner.list(query)
    }

    fn with_active_reminders(&self) -> Result<Vec<Enquiry>, RepositoryError> {
        self.inner.with_active_reminders()
    }

    fn by_status(&self, status: EnquiryStatus) -> Result<Vec<Enquiry>, RepositoryError> {
        self.inner.by_status(status)
    }

    fn subscribe(&self) -> broadcast::Receiver<RecordChange> {
        self.inner.subscribe()
    }
}

/// Store whose reads keep returning the records it was opened with while writes go to the
/// live collection, like a device working from a cached page.
pub(super) struct LaggingReadStore {
    pub(super) live: MemoryEnquiryStore,
    cached: Vec<Enquiry>,
}

impl LaggingReadStore {
    pub(super) fn with(records: Vec<Enquiry>) -> Self {
        let live = MemoryEnquiryStore::default();
        live.seed(records.clone());
        Self {
            live,
            cached: records,
        }
    }

    fn cached_where<F>(&self, keep: F) -> Vec<Enquiry>
    where
        F: Fn(&Enquiry) -> bool,
    {
        self.cached.iter().filter(|record| keep(record)).cloned().collect()
    }
}

impl EnquiryRepository for LaggingReadStore {
    fn insert(&self, record: Enquiry) -> Result<Enquiry, RepositoryError> {
        self.live.insert(record)
    }

    fn update(&self, record: Enquiry) -> Result<(), RepositoryError> {
        self.live.update(record)
    }

    fn modify<F>(&self, id: &EnquiryId, change: F) -> Result<Option<Enquiry>, RepositoryError>
    where
        F: FnOnce(&Enquiry) -> Option<Enquiry>,
    {
        self.live.modify(id, change)
    }

    fn fetch(&self, id: &EnquiryId) -> Result<Option<Enquiry>, RepositoryError> {
        Ok(self.cached.iter().find(|record| record.id == *id).cloned())
    }

    fn delete(&self, id: &EnquiryId) -> Result<(), RepositoryError> {
        self.live.delete(id)
    }

    fn list(&self, query: &EnquiryQuery) -> Result<Vec<Enquiry>, RepositoryError> {
        Ok(self.cached_where(|record| query.matches(record)))
    }

    fn with_active_reminders(&self) -> Result<Vec<Enquiry>, RepositoryError> {
        Ok(self.cached_where(Enquiry::has_active_reminder))
    }

    fn by_status(&self, status: EnquiryStatus) -> Result<Vec<Enquiry>, RepositoryError> {
        Ok(self.cached_where(|record| record.status == status))
    }

    fn subscribe(&self) -> broadcast::Receiver<RecordChange> {
        self.live.subscribe()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
