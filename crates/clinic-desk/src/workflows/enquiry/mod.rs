//! Enquiry lifecycle: intake, the status state machine, deferral reminders that fall back to
//! pending when they lapse, and the deduplicated alert raised when that happens.

pub mod document;
pub mod domain;
pub mod lifecycle;
pub mod notification;
pub mod poller;
pub mod reminder;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;
pub mod timeline;

#[cfg(test)]
mod tests;

pub use document::{parse_export, DocumentError, EnquiryDocument};
pub use domain::{
    Enquiry, EnquiryId, EnquiryStatus, IntakeError, NewEnquiry, NotificationState,
    ReminderDuration, ReminderSchedule,
};
pub use lifecycle::{apply, EnquiryCommand, LifecycleEffect, LifecycleError, Transition};
pub use notification::{
    FileMarkerStore, InMemoryMarkerStore, MarkerStore, NotificationError, NotificationGate,
    NotificationPolicy, NotificationSink, ReminderAlert,
};
pub use poller::{PollerHandle, ReminderPoller};
pub use reminder::{RemainingTime, ReminderStatusView};
pub use repository::{EnquiryQuery, EnquiryRepository, RecordChange, RepositoryError};
pub use router::enquiry_router;
pub use service::{EnquiryService, EnquiryServiceError, SweepReport};
pub use session::ViewingSession;
pub use timeline::{timeline, TimelineEvent, TimelineState};
