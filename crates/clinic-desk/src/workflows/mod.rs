pub mod analytics;
pub mod audit;
pub mod directory;
pub mod enquiry;
pub mod http;
pub mod timestamp;
pub mod visit;
