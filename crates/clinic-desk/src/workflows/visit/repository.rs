use super::domain::{Visit, VisitId};
pub use crate::store::RepositoryError;

/// Boundary to the hosted visits collection.
pub trait VisitRepository: Send + Sync {
    fn insert(&self, visit: Visit) -> Result<Visit, RepositoryError>;
    fn update(&self, visit: Visit) -> Result<(), RepositoryError>;
    /// Read-change-write of one visit under the store's own lock. `None` skips the write.
    fn modify<F>(&self, id: &VisitId, change: F) -> Result<Option<Visit>, RepositoryError>
    where
        F: FnOnce(&Visit) -> Option<Visit>;
    fn fetch(&self, id: &VisitId) -> Result<Option<Visit>, RepositoryError>;
    fn delete(&self, id: &VisitId) -> Result<(), RepositoryError>;
    /// Every visit, most recent check-in first.
    fn list(&self) -> Result<Vec<Visit>, RepositoryError>;
}
