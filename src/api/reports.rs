//! Report generation endpoints
//!
//! Provides endpoints for generating organization attendance reports
//! and volunteer verification letters from the document store.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::{
    models::{DateRange, LetterEvent, LetterOrganization, OutputFormat, VolunteerLetterData},
    services::export::{export_org_report, filename_slug, volunteer_letter_pdf},
    services::report::{parse_report_date, ReportError, ReportService},
    utils::error::AppResult,
    AppState,
};

/// Create routes for report endpoints
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/org", post(generate_org_report))
        .route("/volunteer-letter", post(generate_volunteer_letter))
}

/// Request body for an organization report
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrgReportRequest {
    /// Organization to report on
    #[validate(length(min = 1, message = "orgId must not be empty"))]
    pub org_id: String,
    /// Inclusive range start (ISO 8601 or YYYY-MM-DD)
    #[validate(length(min = 1, message = "dateFrom must not be empty"))]
    pub date_from: String,
    /// Inclusive range end (ISO 8601 or YYYY-MM-DD)
    #[validate(length(min = 1, message = "dateTo must not be empty"))]
    pub date_to: String,
    /// Output encoding, defaults to JSON
    #[serde(default)]
    pub format: OutputFormat,
}

/// Generate an organization attendance report
///
/// POST /api/v1/reports/org
///
/// Returns the report as JSON, or as a CSV/PDF attachment when the
/// `format` field requests it.
async fn generate_org_report(
    State(state): State<AppState>,
    Json(request): Json<OrgReportRequest>,
) -> AppResult<Response> {
    request.validate()?;

    let range = DateRange {
        from: parse_report_date(&request.date_from)?,
        to: parse_report_date(&request.date_to)?,
    };

    let service = ReportService::new(state.store.clone());
    let report = service.build_org_report(&request.org_id, range).await?;

    info!(
        org_id = %request.org_id,
        format = ?request.format,
        total_events = report.total_events,
        "Generated organization report"
    );

    if request.format == OutputFormat::Json {
        return Ok(Json(report).into_response());
    }

    let body = export_org_report(&report, request.format)?;
    let filename = format!(
        "org-report-{}-{}.{}",
        filename_slug(&report.org.name),
        Utc::now().format("%Y-%m-%d"),
        request.format.file_extension()
    );

    Ok((
        [
            (header::CONTENT_TYPE, request.format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

/// Request body for a volunteer verification letter
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerLetterRequest {
    #[validate(length(min = 1, message = "volunteerName must not be empty"))]
    pub volunteer_name: String,
    pub organization: LetterOrganization,
    #[validate(length(min = 1, message = "dateFrom must not be empty"))]
    pub date_from: String,
    #[validate(length(min = 1, message = "dateTo must not be empty"))]
    pub date_to: String,
    pub total_hours: f64,
    #[serde(default)]
    pub events: Vec<LetterEvent>,
}

/// Generate a volunteer verification letter
///
/// POST /api/v1/reports/volunteer-letter
///
/// Always returns a PDF attachment.
async fn generate_volunteer_letter(
    State(_state): State<AppState>,
    Json(request): Json<VolunteerLetterRequest>,
) -> AppResult<Response> {
    request.validate()?;

    let from = parse_report_date(&request.date_from)?;
    let to = parse_report_date(&request.date_to)?;
    // Letters attest past service of any length; only ordering matters,
    // the report window limits do not apply here.
    if from > to {
        return Err(ReportError::RangeOrder.into());
    }

    let data = VolunteerLetterData {
        volunteer_name: request.volunteer_name,
        organization: request.organization,
        date_range: DateRange { from, to },
        total_hours: request.total_hours,
        events: request.events,
    };

    let body = volunteer_letter_pdf(&data)?;
    let filename = format!("volunteer-letter-{}.pdf", Utc::now().timestamp_millis());

    info!(volunteer = %data.volunteer_name, "Generated volunteer verification letter");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}
