//! In-process stand-ins for the hosted document store. The service binary runs on these and
//! the test suites share them.

mod directory;
mod enquiries;
mod visits;

pub use directory::MemoryDirectory;
pub use enquiries::MemoryEnquiryStore;
pub use visits::MemoryVisitStore;

/// Store failures surfaced to the workflows.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
