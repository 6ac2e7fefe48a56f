//! Visitor check-in/check-out with front-desk overrides, staff attendance and doctor routing.

pub mod domain;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{NewVisit, Visit, VisitId, VisitStatus};
pub use lifecycle::{apply, VisitCommand, VisitLifecycleError};
pub use repository::VisitRepository;
pub use router::visit_router;
pub use service::{VisitService, VisitServiceError};
