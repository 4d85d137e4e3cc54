//! Report aggregation service
//!
//! Validates a report window, fetches the organization's events and
//! attendance from the data source, and reduces them into the
//! organization report. Rendering is `services::export`'s job; this
//! module emits full-precision numbers and performs no rounding.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Months, NaiveDate, Utc};
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{
    AttendanceRecord, DateRange, Event, GroupSummary, OrgReportResult, PerUserSummary,
    ReportEvent, UserProfile,
};
use crate::services::store::{StoreError, VolunteerStore};

/// Maximum inclusive report window, in days.
pub const MAX_RANGE_DAYS: i64 = 730;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("start date must not be after end date")]
    RangeOrder,

    #[error("date range too large, maximum {MAX_RANGE_DAYS} days allowed")]
    RangeTooLarge,

    #[error("end date cannot be more than one year in the future")]
    RangeTooFarInFuture,

    #[error("organization not found: {0}")]
    OrgNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Parse a report bound: RFC 3339, or a bare `YYYY-MM-DD` taken as
/// midnight UTC.
pub fn parse_report_date(value: &str) -> Result<DateTime<Utc>, ReportError> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(ReportError::InvalidDate(value.to_string()))
}

/// Validate a report window. Pure function of its inputs; `now` is a
/// parameter so tests control time.
pub fn validate_date_range(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), ReportError> {
    if from > to {
        return Err(ReportError::RangeOrder);
    }

    if (to - from).num_days() > MAX_RANGE_DAYS {
        return Err(ReportError::RangeTooLarge);
    }

    // Same month/day, year+1 (clamped for Feb 29)
    let one_year_from_now = now
        .checked_add_months(Months::new(12))
        .ok_or(ReportError::RangeTooFarInFuture)?;
    if to > one_year_from_now {
        return Err(ReportError::RangeTooFarInFuture);
    }

    Ok(())
}

/// Builds organization attendance reports against a [`VolunteerStore`].
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn VolunteerStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn VolunteerStore>) -> Self {
        Self { store }
    }

    /// Build the full report for one organization and window.
    ///
    /// Validator failures and a missing organization are fatal; a failed
    /// profile-lookup chunk degrades to placeholder labels instead.
    pub async fn build_org_report(
        &self,
        org_id: &str,
        range: DateRange,
    ) -> Result<OrgReportResult, ReportError> {
        validate_date_range(range.from, range.to, Utc::now())?;

        let org = self
            .store
            .get_organization(org_id)
            .await?
            .ok_or_else(|| ReportError::OrgNotFound(org_id.to_string()))?;

        // Date filtering is always re-checked here rather than trusted to
        // the store, whose date comparisons may be string-typed.
        let mut events: Vec<Event> = self
            .store
            .get_events_by_org(org_id)
            .await?
            .into_iter()
            .filter(|e| e.scheduled_date >= range.from && e.scheduled_date <= range.to)
            .collect();
        events.sort_by(|a, b| (a.scheduled_date, &a.id).cmp(&(b.scheduled_date, &b.id)));

        let event_ids: HashSet<&str> = events.iter().map(|e| e.id.as_str()).collect();

        let attendance: Vec<AttendanceRecord> = self
            .store
            .get_attendance_by_org(org_id)
            .await?
            .into_iter()
            .filter(|a| event_ids.contains(a.event_id.as_str()))
            .collect();

        debug!(
            org_id,
            events = events.len(),
            records = attendance.len(),
            "aggregating attendance"
        );

        let total_events = events.len() as u64;
        let total_participants: u64 = attendance
            .iter()
            .map(|a| u64::from(a.participant_count))
            .sum();
        // The stored totalHours is authoritative; never recomputed from
        // participantCount x hoursPerParticipant.
        let total_hours: f64 = attendance.iter().map(|a| a.total_hours).sum();

        let average_hours_per_participant = if total_participants > 0 {
            total_hours / total_participants as f64
        } else {
            0.0
        };
        let average_participants_per_event = if total_events > 0 {
            total_participants as f64 / total_events as f64
        } else {
            0.0
        };

        let profiles = self.hydrate_profiles(&attendance).await;

        Ok(OrgReportResult {
            org,
            date_range: range,
            total_events,
            total_participants,
            total_hours,
            average_hours_per_participant,
            average_participants_per_event,
            per_event_breakdown: build_event_breakdown(&events, &attendance),
            per_user_summaries: build_per_user_summaries(&attendance, &profiles),
            group_summaries: build_group_summaries(&attendance),
        })
    }

    /// Resolve user ids to profiles, chunked at the store's multi-get
    /// limit with chunks fetched concurrently. A failed chunk is logged
    /// and skipped; the affected summaries fall back to the raw id.
    async fn hydrate_profiles(
        &self,
        attendance: &[AttendanceRecord],
    ) -> HashMap<String, UserProfile> {
        let mut ids: Vec<String> = attendance
            .iter()
            .filter_map(|a| a.subject.user_id())
            .map(str::to_string)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        ids.sort();

        if ids.is_empty() {
            return HashMap::new();
        }

        let limit = self.store.profile_batch_limit().max(1);
        let lookups = ids
            .chunks(limit)
            .map(|chunk| self.store.get_user_profiles(chunk));

        let mut profiles = HashMap::new();
        for result in join_all(lookups).await {
            match result {
                Ok(chunk) => profiles.extend(chunk),
                Err(e) => warn!(error = %e, "profile lookup failed, using placeholder labels"),
            }
        }
        profiles
    }
}

fn build_event_breakdown(
    events: &[Event],
    attendance: &[AttendanceRecord],
) -> Vec<ReportEvent> {
    events
        .iter()
        .map(|event| {
            let participants: u64 = attendance
                .iter()
                .filter(|a| a.event_id == event.id)
                .map(|a| u64::from(a.participant_count))
                .sum();

            ReportEvent {
                id: event.id.clone(),
                name: event.name.clone(),
                date: event.scheduled_date,
                scheduled_duration_hours: event.scheduled_duration_hours,
                participants,
                location: event.location.clone(),
                capacity: event.capacity,
            }
        })
        .collect()
}

fn build_per_user_summaries(
    attendance: &[AttendanceRecord],
    profiles: &HashMap<String, UserProfile>,
) -> Vec<PerUserSummary> {
    let mut by_user: HashMap<&str, (f64, HashSet<&str>)> = HashMap::new();

    for record in attendance {
        if let Some(user_id) = record.subject.user_id() {
            let entry = by_user.entry(user_id).or_default();
            entry.0 += record.total_hours;
            entry.1.insert(record.event_id.as_str());
        }
    }

    let mut summaries: Vec<PerUserSummary> = by_user
        .into_iter()
        .map(|(user_id, (total_hours, event_ids))| {
            let profile = profiles.get(user_id);
            PerUserSummary {
                user_id: user_id.to_string(),
                display_name: profile.and_then(|p| p.name.clone()),
                email: profile.and_then(|p| p.email.clone()),
                total_hours,
                // Distinct events, not record count: two records on the
                // same event count that event once.
                total_events_attended: event_ids.len() as u64,
            }
        })
        .collect();

    summaries.sort_by(|a, b| a.user_id.cmp(&b.user_id));
    summaries
}

fn build_group_summaries(attendance: &[AttendanceRecord]) -> Vec<GroupSummary> {
    let mut by_group: HashMap<&str, (u64, f64, HashSet<&str>)> = HashMap::new();

    for record in attendance {
        if let Some(label) = record.subject.group_label() {
            let entry = by_group.entry(label).or_default();
            entry.0 += u64::from(record.participant_count);
            entry.1 += record.total_hours;
            entry.2.insert(record.event_id.as_str());
        }
    }

    let mut summaries: Vec<GroupSummary> = by_group
        .into_iter()
        .map(|(label, (total_participants, total_hours, event_ids))| GroupSummary {
            group_label: label.to_string(),
            total_participants,
            total_hours,
            total_events_attended: event_ids.len() as u64,
        })
        .collect();

    summaries.sort_by(|a, b| a.group_label.cmp(&b.group_label));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceSubject;
    use chrono::TimeZone;

    fn ts(value: &str) -> DateTime<Utc> {
        value.parse().unwrap()
    }

    fn individual(id: &str, event_id: &str, user_id: &str, total_hours: f64) -> AttendanceRecord {
        AttendanceRecord {
            id: id.to_string(),
            event_id: event_id.to_string(),
            org_id: "org-1".to_string(),
            subject: AttendanceSubject::User {
                user_id: user_id.to_string(),
            },
            participant_count: 1,
            hours_per_participant: total_hours,
            total_hours,
            created_at: Utc.with_ymd_and_hms(2025, 11, 15, 9, 0, 0).unwrap(),
        }
    }

    fn group(
        id: &str,
        event_id: &str,
        label: &str,
        participants: u32,
        total_hours: f64,
    ) -> AttendanceRecord {
        AttendanceRecord {
            id: id.to_string(),
            event_id: event_id.to_string(),
            org_id: "org-1".to_string(),
            subject: AttendanceSubject::Group {
                group_label: label.to_string(),
            },
            participant_count: participants,
            hours_per_participant: total_hours / f64::from(participants),
            total_hours,
            created_at: Utc.with_ymd_and_hms(2025, 11, 15, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_parse_report_date_rfc3339() {
        let parsed = parse_report_date("2025-11-15T09:00:00Z").unwrap();
        assert_eq!(parsed, ts("2025-11-15T09:00:00Z"));
    }

    #[test]
    fn test_parse_report_date_plain_date_is_midnight_utc() {
        let parsed = parse_report_date("2025-11-15").unwrap();
        assert_eq!(parsed, ts("2025-11-15T00:00:00Z"));
    }

    #[test]
    fn test_parse_report_date_rejects_garbage() {
        assert!(matches!(
            parse_report_date("not-a-date"),
            Err(ReportError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_report_date("2025-02-30"),
            Err(ReportError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_validate_accepts_valid_window() {
        let now = ts("2025-06-01T00:00:00Z");
        assert!(validate_date_range(
            ts("2025-01-01T00:00:00Z"),
            ts("2025-12-31T00:00:00Z"),
            now
        )
        .is_ok());
    }

    #[test]
    fn test_validate_rejects_reversed_bounds_regardless_of_span() {
        let now = ts("2025-06-01T00:00:00Z");
        let result = validate_date_range(
            ts("2025-06-02T00:00:00Z"),
            ts("2025-06-01T00:00:00Z"),
            now,
        );
        assert!(matches!(result, Err(ReportError::RangeOrder)));
    }

    #[test]
    fn test_validate_rejects_span_over_730_days() {
        let now = ts("2025-06-01T00:00:00Z");
        let result = validate_date_range(
            ts("2023-01-01T00:00:00Z"),
            ts("2025-06-01T00:00:00Z"),
            now,
        );
        assert!(matches!(result, Err(ReportError::RangeTooLarge)));
    }

    #[test]
    fn test_validate_accepts_exactly_730_days() {
        let now = ts("2025-06-01T00:00:00Z");
        assert!(validate_date_range(
            ts("2023-06-02T00:00:00Z"),
            ts("2025-06-01T00:00:00Z"),
            now
        )
        .is_ok());
    }

    #[test]
    fn test_validate_rejects_end_more_than_a_year_out() {
        let now = ts("2025-06-01T00:00:00Z");
        // 400 days ahead of "now"
        let result = validate_date_range(
            ts("2025-06-01T00:00:00Z"),
            now + chrono::Duration::days(400),
            now,
        );
        assert!(matches!(result, Err(ReportError::RangeTooFarInFuture)));
    }

    #[test]
    fn test_validate_accepts_end_exactly_one_year_out() {
        let now = ts("2025-06-01T00:00:00Z");
        assert!(validate_date_range(now, ts("2026-06-01T00:00:00Z"), now).is_ok());
    }

    #[test]
    fn test_per_user_counts_distinct_events() {
        let records = vec![
            individual("a1", "event-1", "u1", 3.0),
            individual("a2", "event-1", "u1", 2.0),
            individual("a3", "event-2", "u1", 4.0),
        ];
        let summaries = build_per_user_summaries(&records, &HashMap::new());

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total_events_attended, 2);
        assert!((summaries[0].total_hours - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_per_user_summaries_skip_group_records() {
        let records = vec![
            individual("a1", "event-1", "u1", 3.0),
            group("a2", "event-1", "Section A", 25, 75.0),
        ];
        let summaries = build_per_user_summaries(&records, &HashMap::new());
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].user_id, "u1");
    }

    #[test]
    fn test_group_summaries_accumulate() {
        let records = vec![
            group("a1", "event-1", "Section A", 25, 75.0),
            group("a2", "event-2", "Section A", 20, 60.0),
            group("a3", "event-1", "Section B", 18, 54.0),
        ];
        let summaries = build_group_summaries(&records);

        assert_eq!(summaries.len(), 2);
        let section_a = &summaries[0];
        assert_eq!(section_a.group_label, "Section A");
        assert_eq!(section_a.total_participants, 45);
        assert!((section_a.total_hours - 135.0).abs() < 1e-9);
        assert_eq!(section_a.total_events_attended, 2);
    }

    #[test]
    fn test_event_breakdown_sums_participants() {
        let events = vec![Event {
            id: "event-1".to_string(),
            name: "Beach Cleanup".to_string(),
            scheduled_date: ts("2025-11-15T09:00:00Z"),
            scheduled_duration_hours: 3.0,
            location: "Ocean Beach".to_string(),
            organization_id: "org-1".to_string(),
            capacity: 50,
        }];
        let records = vec![
            individual("a1", "event-1", "u1", 3.0),
            group("a2", "event-1", "Section A", 25, 75.0),
        ];

        let breakdown = build_event_breakdown(&events, &records);
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].participants, 26);
    }
}
