//! Front-desk workflows for a clinic: visitor check-in/out, enquiries that move through a
//! status lifecycle with deferred reminders, the staff/doctor directory, and dashboard analytics.

pub mod clock;
pub mod config;
pub mod error;
pub mod store;
pub mod telemetry;
pub mod workflows;
