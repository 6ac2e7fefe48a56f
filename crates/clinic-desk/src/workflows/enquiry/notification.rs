//! One-time "back to pending" alerts and their dedup markers.
//!
//! Two markers gate an alert: a per-device marker kept by the hosting process (`lastShown:<id>`
//! mapped to epoch millis) and the `last_notification_shown` field stored on the record. Both
//! must be absent or older than the dedup window before a new alert fires.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{Enquiry, EnquiryId, EnquiryStatus};

pub const MARKER_PREFIX: &str = "lastShown:";

pub fn marker_key(id: &EnquiryId) -> String {
    format!("{MARKER_PREFIX}{}", id.0)
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("marker store unavailable: {0}")]
    Markers(String),
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Per-device "last shown" flags.
pub trait MarkerStore: Send + Sync {
    fn last_shown(&self, id: &EnquiryId) -> Result<Option<DateTime<Utc>>, NotificationError>;
    fn mark_shown(&self, id: &EnquiryId, at: DateTime<Utc>) -> Result<(), NotificationError>;
    /// Drop markers older than `cutoff`, returning how many were removed.
    fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, NotificationError>;
}

fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

fn retain_recent(markers: &mut BTreeMap<String, i64>, cutoff: DateTime<Utc>) -> usize {
    let before = markers.len();
    let cutoff = cutoff.timestamp_millis();
    markers.retain(|key, millis| !key.starts_with(MARKER_PREFIX) || *millis >= cutoff);
    before - markers.len()
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryMarkerStore {
    markers: Arc<Mutex<BTreeMap<String, i64>>>,
}

impl InMemoryMarkerStore {
    pub fn len(&self) -> usize {
        self.markers.lock().expect("marker mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MarkerStore for InMemoryMarkerStore {
    fn last_shown(&self, id: &EnquiryId) -> Result<Option<DateTime<Utc>>, NotificationError> {
        let guard = self.markers.lock().expect("marker mutex poisoned");
        Ok(guard.get(&marker_key(id)).copied().and_then(from_millis))
    }

    fn mark_shown(&self, id: &EnquiryId, at: DateTime<Utc>) -> Result<(), NotificationError> {
        let mut guard = self.markers.lock().expect("marker mutex poisoned");
        guard.insert(marker_key(id), at.timestamp_millis());
        Ok(())
    }

    fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, NotificationError> {
        let mut guard = self.markers.lock().expect("marker mutex poisoned");
        Ok(retain_recent(&mut guard, cutoff))
    }
}

/// Markers persisted as a flat JSON object so they survive restarts of the hosting process.
#[derive(Debug)]
pub struct FileMarkerStore {
    path: PathBuf,
    markers: Mutex<BTreeMap<String, i64>>,
}

impl FileMarkerStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, NotificationError> {
        let path = path.as_ref().to_path_buf();
        let markers = match std::fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|err| NotificationError::Markers(format!("{}: {err}", path.display())))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(NotificationError::Markers(format!(
                    "{}: {err}",
                    path.display()
                )))
            }
        };

        Ok(Self {
            path,
            markers: Mutex::new(markers),
        })
    }

    fn flush(&self, markers: &BTreeMap<String, i64>) -> Result<(), NotificationError> {
        let bytes = serde_json::to_vec_pretty(markers)
            .map_err(|err| NotificationError::Markers(err.to_string()))?;
        std::fs::write(&self.path, bytes)
            .map_err(|err| NotificationError::Markers(format!("{}: {err}", self.path.display())))
    }
}

impl MarkerStore for FileMarkerStore {
    fn last_shown(&self, id: &EnquiryId) -> Result<Option<DateTime<Utc>>, NotificationError> {
        let guard = self.markers.lock().expect("marker mutex poisoned");
        Ok(guard.get(&marker_key(id)).copied().and_then(from_millis))
    }

    fn mark_shown(&self, id: &EnquiryId, at: DateTime<Utc>) -> Result<(), NotificationError> {
        let mut guard = self.markers.lock().expect("marker mutex poisoned");
        guard.insert(marker_key(id), at.timestamp_millis());
        self.flush(&guard)
    }

    fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, NotificationError> {
        let mut guard = self.markers.lock().expect("marker mutex poisoned");
        let removed = retain_recent(&mut guard, cutoff);
        if removed > 0 {
            self.flush(&guard)?;
        }
        Ok(removed)
    }
}

/// Dedup window shared by the local and stored markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationPolicy {
    pub window: Duration,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            window: Duration::minutes(30),
        }
    }
}

impl NotificationPolicy {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn allows(
        &self,
        local: Option<DateTime<Utc>>,
        stored: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        let outside = |marker: Option<DateTime<Utc>>| match marker {
            Some(at) => now - at > self.window,
            None => true,
        };
        outside(local) && outside(stored)
    }
}

/// Alert raised when a reminder returns a record to pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderAlert {
    pub enquiry_id: EnquiryId,
    pub patient_name: String,
    pub enquirer_name: String,
    pub pending_since: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_status: Option<EnquiryStatus>,
    pub raised_at: DateTime<Utc>,
}

impl ReminderAlert {
    pub fn for_record(
        record: &Enquiry,
        original_status: Option<EnquiryStatus>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            enquiry_id: record.id.clone(),
            patient_name: record.patient_name.clone(),
            enquirer_name: record.enquirer_name.clone(),
            pending_since: record.notification.pending_since,
            original_status,
            raised_at: now,
        }
    }
}

/// Outbound hook for alerts (viewer pop-up, log line, push channel).
pub trait NotificationSink: Send + Sync {
    fn publish(&self, alert: ReminderAlert) -> Result<(), NotificationError>;
}

/// Combines the dedup policy with this process's marker store.
pub struct NotificationGate<M> {
    policy: NotificationPolicy,
    markers: Arc<M>,
}

impl<M> NotificationGate<M>
where
    M: MarkerStore,
{
    pub fn new(policy: NotificationPolicy, markers: Arc<M>) -> Self {
        Self { policy, markers }
    }

    pub fn policy(&self) -> NotificationPolicy {
        self.policy
    }

    /// Decide whether an expiry detection for `record` surfaces an alert. When it does, the
    /// local marker is written before returning; persisting the stored marker is up to the
    /// caller.
    pub fn admit(
        &self,
        record: &Enquiry,
        original_status: Option<EnquiryStatus>,
        now: DateTime<Utc>,
    ) -> Option<ReminderAlert> {
        let local = match self.markers.last_shown(&record.id) {
            Ok(value) => value,
            Err(err) => {
                warn!(enquiry_id = %record.id, error = %err, "marker lookup failed; treating as never shown");
                None
            }
        };
        let stored = record.notification.last_notification_shown;

        if !self.policy.allows(local, stored, now) {
            return None;
        }

        if let Err(err) = self.markers.mark_shown(&record.id, now) {
            warn!(enquiry_id = %record.id, error = %err, "failed to record local notification marker");
        }

        Some(ReminderAlert::for_record(record, original_status, now))
    }

    pub fn prune(&self, now: DateTime<Utc>, retention: Duration) -> usize {
        match self.markers.prune_older_than(now - retention) {
            Ok(removed) => removed,
            Err(err) => {
                warn!(error = %err, "could not prune notification markers");
                0
            }
        }
    }
}
