//! Mock services for testing
//!
//! Provides an in-memory implementation of the document store for
//! isolated testing without external dependencies.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use peak_impact_reports::models::{
    AttendanceRecord, AttendanceSubject, Event, Organization, UserProfile,
};
use peak_impact_reports::services::store::{StoreError, VolunteerStore};

/// Mock document store for testing
pub struct MockStore {
    orgs: RwLock<HashMap<String, Organization>>,
    events: RwLock<Vec<Event>>,
    attendance: RwLock<Vec<AttendanceRecord>>,
    profiles: RwLock<HashMap<String, UserProfile>>,
    /// Simulate errors when set
    error_mode: RwLock<Option<StoreError>>,
    /// Simulate errors on profile lookups only
    profile_error_mode: RwLock<Option<StoreError>>,
    batch_limit: usize,
    /// Call counters, used to assert fetch ordering and chunking
    pub org_calls: AtomicUsize,
    pub event_calls: AtomicUsize,
    pub attendance_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            orgs: RwLock::new(HashMap::new()),
            events: RwLock::new(Vec::new()),
            attendance: RwLock::new(Vec::new()),
            profiles: RwLock::new(HashMap::new()),
            error_mode: RwLock::new(None),
            profile_error_mode: RwLock::new(None),
            batch_limit: 10,
            org_calls: AtomicUsize::new(0),
            event_calls: AtomicUsize::new(0),
            attendance_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit;
        self
    }

    /// Set error mode to simulate store failures
    pub fn set_error_mode(&self, error: StoreError) {
        *self.error_mode.write().unwrap() = Some(error);
    }

    /// Fail only profile lookups, leaving the other endpoints healthy
    pub fn set_profile_error_mode(&self, error: StoreError) {
        *self.profile_error_mode.write().unwrap() = Some(error);
    }

    fn check_error(&self) -> Result<(), StoreError> {
        if let Some(ref error) = *self.error_mode.read().unwrap() {
            return Err(error.clone());
        }
        Ok(())
    }

    pub fn add_org(&self, org: Organization) {
        self.orgs.write().unwrap().insert(org.id.clone(), org);
    }

    pub fn add_event(&self, event: Event) {
        self.events.write().unwrap().push(event);
    }

    pub fn add_attendance(&self, record: AttendanceRecord) {
        self.attendance.write().unwrap().push(record);
    }

    pub fn add_profile(&self, profile: UserProfile) {
        self.profiles
            .write()
            .unwrap()
            .insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl VolunteerStore for MockStore {
    async fn get_organization(&self, org_id: &str) -> Result<Option<Organization>, StoreError> {
        self.org_calls.fetch_add(1, Ordering::SeqCst);
        self.check_error()?;
        Ok(self.orgs.read().unwrap().get(org_id).cloned())
    }

    async fn get_events_by_org(&self, org_id: &str) -> Result<Vec<Event>, StoreError> {
        self.event_calls.fetch_add(1, Ordering::SeqCst);
        self.check_error()?;
        Ok(self
            .events
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.organization_id == org_id)
            .cloned()
            .collect())
    }

    async fn get_attendance_by_org(
        &self,
        org_id: &str,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.attendance_calls.fetch_add(1, Ordering::SeqCst);
        self.check_error()?;
        Ok(self
            .attendance
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.org_id == org_id)
            .cloned()
            .collect())
    }

    async fn get_user_profiles(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, UserProfile>, StoreError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.check_error()?;
        if let Some(ref error) = *self.profile_error_mode.read().unwrap() {
            return Err(error.clone());
        }
        let profiles = self.profiles.read().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| profiles.get(id).cloned().map(|p| (id.clone(), p)))
            .collect())
    }

    fn profile_batch_limit(&self) -> usize {
        self.batch_limit
    }
}

/// Build an attendance record for a single user
pub fn user_attendance(
    id: &str,
    event_id: &str,
    org_id: &str,
    user_id: &str,
    hours: f64,
) -> AttendanceRecord {
    AttendanceRecord {
        id: id.to_string(),
        event_id: event_id.to_string(),
        org_id: org_id.to_string(),
        subject: AttendanceSubject::User {
            user_id: user_id.to_string(),
        },
        participant_count: 1,
        hours_per_participant: hours,
        total_hours: hours,
        created_at: Utc.with_ymd_and_hms(2025, 11, 15, 12, 0, 0).unwrap(),
    }
}

/// Build an attendance record for a group
pub fn group_attendance(
    id: &str,
    event_id: &str,
    org_id: &str,
    label: &str,
    participants: u32,
    hours_each: f64,
) -> AttendanceRecord {
    AttendanceRecord {
        id: id.to_string(),
        event_id: event_id.to_string(),
        org_id: org_id.to_string(),
        subject: AttendanceSubject::Group {
            group_label: label.to_string(),
        },
        participant_count: participants,
        hours_per_participant: hours_each,
        total_hours: hours_each * f64::from(participants),
        created_at: Utc.with_ymd_and_hms(2025, 11, 15, 12, 0, 0).unwrap(),
    }
}

pub fn sample_event(id: &str, org_id: &str, name: &str, date: &str) -> Event {
    Event {
        id: id.to_string(),
        name: name.to_string(),
        scheduled_date: date.parse().unwrap(),
        scheduled_duration_hours: 3.0,
        location: "Ocean Beach".to_string(),
        organization_id: org_id.to_string(),
        capacity: 50,
    }
}

/// Seed the fixture data used across the report tests: one school
/// organization with two events, one repeat volunteer, and one group
/// attendance block.
pub fn seed_mountain_view(store: &MockStore) {
    store.add_org(Organization {
        id: "org-1".to_string(),
        name: "Mountain View High School".to_string(),
        tax_id: Some("12-3456789".to_string()),
        admin_user_ids: vec!["admin-1".to_string()],
    });

    store.add_event(sample_event(
        "event-1",
        "org-1",
        "Beach Cleanup",
        "2025-11-15T09:00:00Z",
    ));
    store.add_event(sample_event(
        "event-2",
        "org-1",
        "Food Drive",
        "2025-12-06T10:00:00Z",
    ));

    store.add_attendance(user_attendance("att-1", "event-1", "org-1", "u1", 3.0));
    store.add_attendance(user_attendance("att-2", "event-2", "org-1", "u1", 4.0));
    store.add_attendance(group_attendance(
        "att-3", "event-1", "org-1", "Section A", 25, 3.0,
    ));

    store.add_profile(UserProfile {
        id: "u1".to_string(),
        name: Some("John Doe".to_string()),
        email: Some("john.doe@example.com".to_string()),
    });
}
