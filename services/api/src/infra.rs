use chrono::{DateTime, Utc};
use clinic_desk::clock::Clock;
use clinic_desk::config::ReminderConfig;
use clinic_desk::error::AppError;
use clinic_desk::store::{MemoryDirectory, MemoryEnquiryStore, MemoryVisitStore};
use clinic_desk::workflows::audit::Actor;
use clinic_desk::workflows::directory::DirectoryService;
use clinic_desk::workflows::enquiry::{
    parse_export, EnquiryId, EnquiryService, FileMarkerStore, InMemoryMarkerStore, MarkerStore,
    NotificationError, NotificationPolicy, NotificationSink, ReminderAlert,
};
use clinic_desk::workflows::visit::VisitService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

const RECENT_ALERT_CAPACITY: usize = 50;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Alerts raised by this process. Each one is logged and the newest are kept for
/// `GET /api/v1/notifications`.
pub(crate) struct AlertFeed {
    recent: Mutex<VecDeque<ReminderAlert>>,
    capacity: usize,
}

impl Default for AlertFeed {
    fn default() -> Self {
        Self::with_capacity(RECENT_ALERT_CAPACITY)
    }
}

impl AlertFeed {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            recent: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Newest first.
    pub(crate) fn recent(&self) -> Vec<ReminderAlert> {
        self.recent
            .lock()
            .expect("alert mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }
}

impl NotificationSink for AlertFeed {
    fn publish(&self, alert: ReminderAlert) -> Result<(), NotificationError> {
        info!(
            enquiry_id = %alert.enquiry_id,
            patient = %alert.patient_name,
            enquirer = %alert.enquirer_name,
            original_status = ?alert.original_status,
            "enquiry returned to pending after its reminder expired"
        );
        let mut guard = self.recent.lock().expect("alert mutex poisoned");
        if guard.len() == self.capacity {
            guard.pop_back();
        }
        guard.push_front(alert);
        Ok(())
    }
}

/// "Last shown" markers for this host: a JSON file when a path is configured, otherwise memory.
pub(crate) enum DeviceMarkers {
    File(FileMarkerStore),
    Memory(InMemoryMarkerStore),
}

impl DeviceMarkers {
    pub(crate) fn from_config(config: &ReminderConfig) -> Result<Self, NotificationError> {
        match &config.marker_path {
            Some(path) => {
                info!(path = %path.display(), "using file-backed notification markers");
                Ok(Self::File(FileMarkerStore::open(path)?))
            }
            None => Ok(Self::Memory(InMemoryMarkerStore::default())),
        }
    }
}

impl MarkerStore for DeviceMarkers {
    fn last_shown(&self, id: &EnquiryId) -> Result<Option<DateTime<Utc>>, NotificationError> {
        match self {
            Self::File(store) => store.last_shown(id),
            Self::Memory(store) => store.last_shown(id),
        }
    }

    fn mark_shown(&self, id: &EnquiryId, at: DateTime<Utc>) -> Result<(), NotificationError> {
        match self {
            Self::File(store) => store.mark_shown(id, at),
            Self::Memory(store) => store.mark_shown(id, at),
        }
    }

    fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, NotificationError> {
        match self {
            Self::File(store) => store.prune_older_than(cutoff),
            Self::Memory(store) => store.prune_older_than(cutoff),
        }
    }
}

pub(crate) type ApiEnquiryService = EnquiryService<MemoryEnquiryStore, DeviceMarkers, AlertFeed>;

/// Everything the HTTP surface and the CLI commands share.
pub(crate) struct Services {
    pub(crate) store: Arc<MemoryEnquiryStore>,
    pub(crate) alerts: Arc<AlertFeed>,
    pub(crate) enquiries: Arc<ApiEnquiryService>,
    pub(crate) visits: Arc<VisitService<MemoryVisitStore>>,
    pub(crate) directory: Arc<DirectoryService<MemoryDirectory>>,
}

impl Services {
    pub(crate) fn build(config: &ReminderConfig, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let markers = Arc::new(DeviceMarkers::from_config(config)?);
        let store = Arc::new(MemoryEnquiryStore::default());
        let alerts = Arc::new(AlertFeed::default());

        let enquiries = EnquiryService::new(
            store.clone(),
            markers,
            alerts.clone(),
            clock.clone(),
            NotificationPolicy::new(config.dedup_window),
        )
        .with_marker_retention(config.marker_retention);

        Ok(Self {
            store,
            alerts,
            enquiries: Arc::new(enquiries),
            visits: Arc::new(VisitService::new(
                Arc::new(MemoryVisitStore::default()),
                clock.clone(),
            )),
            directory: Arc::new(DirectoryService::new(
                Arc::new(MemoryDirectory::default()),
                clock,
            )),
        })
    }

    /// Load enquiries from a JSON export of the record store.
    pub(crate) fn seed_from(&self, path: &Path) -> Result<usize, AppError> {
        let bytes = std::fs::read(path)?;
        let records = parse_export(&bytes)?;
        let loaded = self.store.seed(records);
        info!(path = %path.display(), loaded, "seeded enquiries from export");
        Ok(loaded)
    }
}

/// Identity stamped on writes made by the process itself.
pub(crate) fn system_actor() -> Actor {
    Actor::new("system").with_name("Reminder poller")
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_desk::workflows::enquiry::EnquiryStatus;

    fn alert(id: &str) -> ReminderAlert {
        ReminderAlert {
            enquiry_id: EnquiryId(id.to_string()),
            patient_name: "Anita Menon".to_string(),
            enquirer_name: "Suresh Menon".to_string(),
            pending_since: None,
            original_status: Some(EnquiryStatus::InProgress),
            raised_at: parse_timestamp("2025-03-03T09:30:00Z").expect("valid time"),
        }
    }

    #[test]
    fn alert_feed_keeps_newest_within_capacity() {
        let feed = AlertFeed::with_capacity(2);
        for id in ["a", "b", "c"] {
            feed.publish(alert(id)).expect("publish");
        }
        let ids: Vec<String> = feed
            .recent()
            .into_iter()
            .map(|alert| alert.enquiry_id.0)
            .collect();
        assert_eq!(ids, vec!["c".to_string(), "b".to_string()]);
    }

    #[test]
    fn timestamps_require_rfc3339() {
        assert!(parse_timestamp("2025-03-03T09:30:00+05:30").is_ok());
        assert!(parse_timestamp("03/03/2025").is_err());
    }
}
