//! HTTP client for the platform's document store
//!
//! Talks to the volunteering platform's document-store REST API. All
//! transport failures and non-success responses surface as
//! [`StoreError::Unavailable`] so the caller can retry; a missing
//! organization is `Ok(None)`, not an error.
//!
//! Attendance comes back in one of two shapes depending on how old the
//! source collection is: a flat list of attendance records, or event
//! documents carrying embedded attendee sub-lists. This client
//! normalizes both into flat [`AttendanceRecord`]s.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::models::{AttendanceRecord, AttendanceSubject, Event, Organization, UserProfile};
use crate::services::store::{StoreError, VolunteerStore};

#[derive(Clone)]
pub struct HttpStoreClient {
    client: Client,
    base_url: String,
    profile_batch_limit: usize,
}

impl HttpStoreClient {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        info!("Initializing document store client for {}", config.base_url);

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .use_rustls_tls();

        if let Some(ref token) = config.api_token {
            let mut headers = header::HeaderMap::new();
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .context("Invalid store API token")?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }

        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile_batch_limit: config.profile_batch_limit,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, StoreError> {
        debug!(url, "store GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Unavailable(format!(
                "store returned {} for {}",
                status, url
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))
    }
}

/// Attendee entry embedded on an event document. Hours are derived from
/// the check-in/check-out pair; an entry missing either instant
/// contributes zero hours but is not an error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddedAttendee {
    user_id: Option<String>,
    group_label: Option<String>,
    #[serde(default)]
    participant_count: Option<u32>,
    check_in: Option<DateTime<Utc>>,
    check_out: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventAttendanceDoc {
    event_id: String,
    org_id: String,
    attendees: Vec<EmbeddedAttendee>,
}

/// One document from the attendance endpoint, in either shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AttendanceDoc {
    Flat(AttendanceRecord),
    Embedded(EventAttendanceDoc),
}

impl EmbeddedAttendee {
    fn hours_worked(&self) -> f64 {
        match (self.check_in, self.check_out) {
            (Some(check_in), Some(check_out)) => {
                let ms = (check_out - check_in).num_milliseconds();
                (ms as f64 / 3_600_000.0).max(0.0)
            }
            _ => 0.0,
        }
    }
}

fn flatten_doc(doc: AttendanceDoc, out: &mut Vec<AttendanceRecord>) {
    match doc {
        AttendanceDoc::Flat(record) => out.push(record),
        AttendanceDoc::Embedded(event_doc) => {
            for (index, attendee) in event_doc.attendees.iter().enumerate() {
                let subject = match (&attendee.user_id, &attendee.group_label) {
                    (Some(user_id), None) => AttendanceSubject::User {
                        user_id: user_id.clone(),
                    },
                    (None, Some(label)) => AttendanceSubject::Group {
                        group_label: label.clone(),
                    },
                    _ => {
                        warn!(
                            event_id = %event_doc.event_id,
                            index, "skipping attendee entry without exactly one subject"
                        );
                        continue;
                    }
                };

                let hours = attendee.hours_worked();
                let participant_count = attendee.participant_count.unwrap_or(1).max(1);

                out.push(AttendanceRecord {
                    id: format!("{}-att-{}", event_doc.event_id, index),
                    event_id: event_doc.event_id.clone(),
                    org_id: event_doc.org_id.clone(),
                    subject,
                    participant_count,
                    hours_per_participant: hours,
                    total_hours: hours * f64::from(participant_count),
                    created_at: attendee.created_at.unwrap_or_else(Utc::now),
                });
            }
        }
    }
}

#[async_trait::async_trait]
impl VolunteerStore for HttpStoreClient {
    async fn get_organization(&self, org_id: &str) -> Result<Option<Organization>, StoreError> {
        let url = format!(
            "{}/v1/organizations/{}",
            self.base_url,
            urlencoding::encode(org_id)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<Organization>()
                .await
                .map(Some)
                .map_err(|e| StoreError::Malformed(e.to_string())),
            status => Err(StoreError::Unavailable(format!(
                "store returned {} for {}",
                status, url
            ))),
        }
    }

    async fn get_events_by_org(&self, org_id: &str) -> Result<Vec<Event>, StoreError> {
        let url = format!(
            "{}/v1/organizations/{}/events",
            self.base_url,
            urlencoding::encode(org_id)
        );
        self.get_json(&url).await
    }

    async fn get_attendance_by_org(
        &self,
        org_id: &str,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let url = format!(
            "{}/v1/organizations/{}/attendance",
            self.base_url,
            urlencoding::encode(org_id)
        );

        let docs: Vec<serde_json::Value> = self.get_json(&url).await?;

        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            match serde_json::from_value::<AttendanceDoc>(doc) {
                Ok(parsed) => flatten_doc(parsed, &mut records),
                // One bad document never blocks the whole report.
                Err(e) => warn!(org_id, error = %e, "skipping malformed attendance document"),
            }
        }
        Ok(records)
    }

    async fn get_user_profiles(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, UserProfile>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let joined = ids
            .iter()
            .map(|id| urlencoding::encode(id).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/v1/users?ids={}", self.base_url, joined);

        let profiles: Vec<UserProfile> = self.get_json(&url).await?;
        Ok(profiles.into_iter().map(|p| (p.id.clone(), p)).collect())
    }

    fn profile_batch_limit(&self) -> usize {
        self.profile_batch_limit
    }
}
