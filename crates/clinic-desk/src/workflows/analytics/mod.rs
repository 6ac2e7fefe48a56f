//! Front-desk dashboard figures derived from the visit and enquiry collections.

mod router;
mod summary;
pub mod views;


pub use router::{analytics_router, AnalyticsState};
pub use views::AnalyticsSummary;
