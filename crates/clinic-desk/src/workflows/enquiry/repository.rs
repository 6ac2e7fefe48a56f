use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::domain::{Enquiry, EnquiryId, EnquiryStatus};
pub use crate::store::RepositoryError;

/// Change notification pushed to live subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordChange {
    Upserted(Box<Enquiry>),
    Deleted(EnquiryId),
}

impl RecordChange {
    pub fn id(&self) -> &EnquiryId {
        match self {
            RecordChange::Upserted(record) => &record.id,
            RecordChange::Deleted(id) => id,
        }
    }
}

/// Filters offered by the enquiry table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnquiryQuery {
    /// Case-insensitive match on enquirer name, patient name, or mobile.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<EnquiryStatus>,
    #[serde(default)]
    pub created_on: Option<NaiveDate>,
}

impl EnquiryQuery {
    pub fn matches(&self, record: &Enquiry) -> bool {
        if let Some(search) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            let needle = search.to_lowercase();
            let hit = [
                record.enquirer_name.as_str(),
                record.patient_name.as_str(),
                record.enquirer_mobile.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }

        if let Some(date) = self.created_on {
            if record.created_at.date_naive() != date {
                return false;
            }
        }

        true
    }
}

/// Boundary to the hosted document store.
pub trait EnquiryRepository: Send + Sync {
    fn insert(&self, record: Enquiry) -> Result<Enquiry, RepositoryError>;
    fn update(&self, record: Enquiry) -> Result<(), RepositoryError>;
    /// Run `change` against the stored record and write back what it returns, with no other
    /// write landing in between. `None` leaves the record as stored. Returns the written record.
    fn modify<F>(&self, id: &EnquiryId, change: F) -> Result<Option<Enquiry>, RepositoryError>
    where
        F: FnOnce(&Enquiry) -> Option<Enquiry>;
    fn fetch(&self, id: &EnquiryId) -> Result<Option<Enquiry>, RepositoryError>;
    fn delete(&self, id: &EnquiryId) -> Result<(), RepositoryError>;
    /// Matching records, newest first.
    fn list(&self, query: &EnquiryQuery) -> Result<Vec<Enquiry>, RepositoryError>;
    fn with_active_reminders(&self) -> Result<Vec<Enquiry>, RepositoryError>;
    /// Records with the given status, newest first.
    fn by_status(&self, status: EnquiryStatus) -> Result<Vec<Enquiry>, RepositoryError>;
    fn subscribe(&self) -> broadcast::Receiver<RecordChange>;
}
