//! Volunteer event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A volunteer event belonging to exactly one organization.
///
/// Events are created by org admins and are read-only for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub scheduled_date: DateTime<Utc>,
    /// Nominal duration in hours; actual per-volunteer hours come from
    /// attendance records.
    pub scheduled_duration_hours: f64,
    pub location: String,
    pub organization_id: String,
    pub capacity: u32,
}
