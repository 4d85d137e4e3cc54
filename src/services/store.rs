//! Store-agnostic data source interface
//!
//! The aggregator treats the document store as an opaque asynchronous
//! repository. Everything it needs is behind this trait, so tests run
//! against an in-memory implementation and production runs against the
//! platform's document-store REST API.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AttendanceRecord, Event, Organization, UserProfile};

/// Errors surfaced by a data source implementation.
///
/// `Unavailable` is retryable by the caller; it covers timeouts,
/// connection failures, and non-success responses from the store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),

    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Read-only repository of organizations, events, attendance, and user
/// profiles.
#[async_trait]
pub trait VolunteerStore: Send + Sync {
    /// Fetch one organization by id. `None` means no such organization.
    async fn get_organization(&self, org_id: &str) -> Result<Option<Organization>, StoreError>;

    /// Fetch all events belonging to an organization. Date filtering is
    /// the aggregator's job; implementations must not assume the caller
    /// trusts store-side date comparisons.
    async fn get_events_by_org(&self, org_id: &str) -> Result<Vec<Event>, StoreError>;

    /// Fetch attendance for an organization as flat records. If the
    /// store keeps attendance embedded on event documents, the
    /// implementation flattens those entries here.
    async fn get_attendance_by_org(
        &self,
        org_id: &str,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Fetch profiles for a batch of user ids. Callers chunk ids to
    /// [`profile_batch_limit`](Self::profile_batch_limit); missing ids
    /// are simply absent from the map, not an error.
    async fn get_user_profiles(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, UserProfile>, StoreError>;

    /// The store's multi-get ("IN" query) limit per round trip.
    fn profile_batch_limit(&self) -> usize {
        10
    }
}
