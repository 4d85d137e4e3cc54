//! Attendance record model
//!
//! An attendance record is the atomic unit of report aggregation. It is
//! either an individual record for one identified user, or a bulk record
//! for a labeled group of unidentified participants. The subject enum
//! makes the two shapes mutually exclusive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who a record is for: a single identified user or an anonymous group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttendanceSubject {
    #[serde(rename_all = "camelCase")]
    User { user_id: String },
    #[serde(rename_all = "camelCase")]
    Group { group_label: String },
}

impl AttendanceSubject {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            AttendanceSubject::User { user_id } => Some(user_id),
            AttendanceSubject::Group { .. } => None,
        }
    }

    pub fn group_label(&self) -> Option<&str> {
        match self {
            AttendanceSubject::User { .. } => None,
            AttendanceSubject::Group { group_label } => Some(group_label),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub event_id: String,
    pub org_id: String,
    #[serde(flatten)]
    pub subject: AttendanceSubject,
    pub participant_count: u32,
    /// Nominal per-participant hours. Informational only: `total_hours`
    /// is the authoritative figure, since real check-in/check-out
    /// durations may differ from the nominal value.
    pub hours_per_participant: f64,
    pub total_hours: f64,
    pub created_at: DateTime<Utc>,
}
