use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;

use super::RepositoryError;
use crate::workflows::enquiry::{
    Enquiry, EnquiryId, EnquiryQuery, EnquiryRepository, EnquiryStatus, RecordChange,
};

const CHANGE_CAPACITY: usize = 256;

/// Enquiry collection with live change notifications.
#[derive(Debug)]
pub struct MemoryEnquiryStore {
    records: Mutex<HashMap<EnquiryId, Enquiry>>,
    changes: broadcast::Sender<RecordChange>,
}

impl Default for MemoryEnquiryStore {
    fn default() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            records: Mutex::new(HashMap::new()),
            changes,
        }
    }
}

impl MemoryEnquiryStore {
    /// Load records imported from an export, replacing any with the same id.
    pub fn seed(&self, records: impl IntoIterator<Item = Enquiry>) -> usize {
        let mut guard = self.records.lock().expect("enquiry store mutex poisoned");
        let mut loaded = 0;
        for record in records {
            guard.insert(record.id.clone(), record);
            loaded += 1;
        }
        loaded
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .expect("enquiry store mutex poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn publish(&self, change: RecordChange) {
        // Nobody listening is fine.
        let _ = self.changes.send(change);
    }

    fn collect<F>(&self, keep: F) -> Vec<Enquiry>
    where
        F: Fn(&Enquiry) -> bool,
    {
        let guard = self.records.lock().expect("enquiry store mutex poisoned");
        let mut records: Vec<Enquiry> = guard.values().filter(|record| keep(record)).cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        records
    }
}

impl EnquiryRepository for MemoryEnquiryStore {
    fn insert(&self, record: Enquiry) -> Result<Enquiry, RepositoryError> {
        {
            let mut guard = self.records.lock().expect("enquiry store mutex poisoned");
            if guard.contains_key(&record.id) {
                return Err(RepositoryError::Conflict);
            }
            guard.insert(record.id.clone(), record.clone());
        }
        self.publish(RecordChange::Upserted(Box::new(record.clone())));
        Ok(record)
    }

    fn update(&self, record: Enquiry) -> Result<(), RepositoryError> {
        {
            let mut guard = self.records.lock().expect("enquiry store mutex poisoned");
            let Some(slot) = guard.get_mut(&record.id) else {
                return Err(RepositoryError::NotFound);
            };
            *slot = record.clone();
        }
        self.publish(RecordChange::Upserted(Box::new(record)));
        Ok(())
    }

    fn modify<F>(&self, id: &EnquiryId, change: F) -> Result<Option<Enquiry>, RepositoryError>
    where
        F: FnOnce(&Enquiry) -> Option<Enquiry>,
    {
        let written = {
            let mut guard = self.records.lock().expect("enquiry store mutex poisoned");
            let slot = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
            let Some(next) = change(slot) else {
                return Ok(None);
            };
            *slot = next.clone();
            next
        };
        self.publish(RecordChange::Upserted(Box::new(written.clone())));
        Ok(Some(written))
    }

    fn fetch(&self, id: &EnquiryId) -> Result<Option<Enquiry>, RepositoryError> {
        let guard = self.records.lock().expect("enquiry store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn delete(&self, id: &EnquiryId) -> Result<(), RepositoryError> {
        let removed = self
            .records
            .lock()
            .expect("enquiry store mutex poisoned")
            .remove(id);
        match removed {
            Some(_) => {
                self.publish(RecordChange::Deleted(id.clone()));
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn list(&self, query: &EnquiryQuery) -> Result<Vec<Enquiry>, RepositoryError> {
        Ok(self.collect(|record| query.matches(record)))
    }

    fn with_active_reminders(&self) -> Result<Vec<Enquiry>, RepositoryError> {
        Ok(self.collect(Enquiry::has_active_reminder))
    }

    fn by_status(&self, status: EnquiryStatus) -> Result<Vec<Enquiry>, RepositoryError> {
        Ok(self.collect(|record| record.status == status))
    }

    fn subscribe(&self) -> broadcast::Receiver<RecordChange> {
        self.changes.subscribe()
    }
}
