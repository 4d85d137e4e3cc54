//! Report request and result types
//!
//! `OrgReportResult` is a pure derived value: it is assembled fresh per
//! request and lives only for the duration of encoding and response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Organization;

/// Output encoding for a generated report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Pdf,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Csv => "text/csv",
            OutputFormat::Pdf => "application/pdf",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Pdf => "pdf",
        }
    }
}

/// Inclusive report window
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Summary for one identified volunteer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerUserSummary {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub total_hours: f64,
    /// Distinct events attended, not record count
    pub total_events_attended: u64,
}

/// Summary for one bulk attendance group
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub group_label: String,
    pub total_participants: u64,
    pub total_hours: f64,
    pub total_events_attended: u64,
}

/// One event enriched with attendance metrics for the report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEvent {
    pub id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub scheduled_duration_hours: f64,
    /// Total participants from this event's attendance records
    pub participants: u64,
    pub location: String,
    pub capacity: u32,
}

/// Complete organization report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgReportResult {
    pub org: Organization,
    pub date_range: DateRange,
    pub total_events: u64,
    pub total_participants: u64,
    pub total_hours: f64,
    pub average_hours_per_participant: f64,
    pub average_participants_per_event: f64,
    pub per_event_breakdown: Vec<ReportEvent>,
    pub per_user_summaries: Vec<PerUserSummary>,
    pub group_summaries: Vec<GroupSummary>,
}

/// Organization details shown on a verification letter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterOrganization {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One line of the letter's hours table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterEvent {
    pub name: String,
    pub date: DateTime<Utc>,
    pub duration_hours: f64,
}

/// Input for the standalone volunteer verification letter.
///
/// The letter encoder trusts these numbers as given; it never recomputes
/// totals from the event list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerLetterData {
    pub volunteer_name: String,
    pub organization: LetterOrganization,
    pub date_range: DateRange,
    pub total_hours: f64,
    pub events: Vec<LetterEvent>,
}
