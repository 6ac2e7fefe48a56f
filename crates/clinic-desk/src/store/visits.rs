use std::collections::HashMap;
use std::sync::Mutex;

use super::RepositoryError;
use crate::workflows::visit::{Visit, VisitId, VisitRepository};

#[derive(Debug, Default)]
pub struct MemoryVisitStore {
    records: Mutex<HashMap<VisitId, Visit>>,
}

impl VisitRepository for MemoryVisitStore {
    fn insert(&self, visit: Visit) -> Result<Visit, RepositoryError> {
        let mut guard = self.records.lock().expect("visit store mutex poisoned");
        if guard.contains_key(&visit.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(visit.id.clone(), visit.clone());
        Ok(visit)
    }

    fn update(&self, visit: Visit) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("visit store mutex poisoned");
        match guard.get_mut(&visit.id) {
            Some(slot) => {
                *slot = visit;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn modify<F>(&self, id: &VisitId, change: F) -> Result<Option<Visit>, RepositoryError>
    where
        F: FnOnce(&Visit) -> Option<Visit>,
    {
        let mut guard = self.records.lock().expect("visit store mutex poisoned");
        let slot = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        let next = change(slot);
        if let Some(visit) = &next {
            *slot = visit.clone();
        }
        Ok(next)
    }

    fn fetch(&self, id: &VisitId) -> Result<Option<Visit>, RepositoryError> {
        let guard = self.records.lock().expect("visit store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn delete(&self, id: &VisitId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("visit store mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn list(&self) -> Result<Vec<Visit>, RepositoryError> {
        let guard = self.records.lock().expect("visit store mutex poisoned");
        let mut visits: Vec<Visit> = guard.values().cloned().collect();
        visits.sort_by(|a, b| b.visited_at().cmp(&a.visited_at()).then_with(|| a.id.cmp(&b.id)));
        Ok(visits)
    }
}
