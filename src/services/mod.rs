//! Services

pub mod export;
pub mod http_store;
pub mod report;
pub mod store;

pub use http_store::HttpStoreClient;
pub use report::ReportService;
pub use store::VolunteerStore;
