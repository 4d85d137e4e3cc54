//! Data models for the reports service

mod attendance;
mod event;
mod organization;
mod report;
mod user;

pub use attendance::*;
pub use event::*;
pub use organization::*;
pub use report::*;
pub use user::*;
