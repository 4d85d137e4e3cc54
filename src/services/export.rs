//! Report output encoders
//!
//! Renders an [`OrgReportResult`] as JSON, CSV, or a paginated PDF, and
//! renders the standalone volunteer verification letter. Encoders are
//! presentation only: they round for display but never recompute any
//! aggregate they are given.

use std::io::BufWriter;

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use thiserror::Error;

use crate::models::{OrgReportResult, OutputFormat, VolunteerLetterData};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF rendering failed: {0}")]
    Pdf(String),
}

/// Encode a report in the requested format.
pub fn export_org_report(
    report: &OrgReportResult,
    format: OutputFormat,
) -> Result<Vec<u8>, ExportError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_vec_pretty(report)?),
        OutputFormat::Csv => Ok(org_report_csv(report).into_bytes()),
        OutputFormat::Pdf => org_report_pdf(report),
    }
}

/// Filename-safe slug: whitespace runs become single hyphens.
pub fn filename_slug(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Human duration label for the letter's hours table: "3 hr 30 min",
/// or "3 hr" when there is no minute remainder.
pub fn duration_label(hours: f64) -> String {
    let hours = hours.max(0.0);
    let mut whole = hours.floor() as i64;
    let mut minutes = ((hours - hours.floor()) * 60.0).round() as i64;
    if minutes == 60 {
        whole += 1;
        minutes = 0;
    }
    if minutes == 0 {
        format!("{} hr", whole)
    } else {
        format!("{} hr {} min", whole, minutes)
    }
}

fn display_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Quote a CSV field when it contains a comma, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render the CSV encoding: header block, report period, summary
/// metrics, events table, then per-user and per-group tables only when
/// non-empty.
pub fn org_report_csv(report: &OrgReportResult) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("Organization Report".to_string());
    lines.push(format!("Organization,{}", csv_field(&report.org.name)));
    if let Some(ref tax_id) = report.org.tax_id {
        lines.push(format!("Tax ID,{}", csv_field(tax_id)));
    }
    lines.push(format!(
        "Report Period,{} - {}",
        display_date(&report.date_range.from),
        display_date(&report.date_range.to)
    ));
    lines.push(String::new());

    lines.push("Summary Metrics".to_string());
    lines.push(format!("Total Events,{}", report.total_events));
    lines.push(format!("Total Participants,{}", report.total_participants));
    lines.push(format!("Total Hours,{:.1}", report.total_hours));
    lines.push(format!(
        "Average Hours per Participant,{:.2}",
        report.average_hours_per_participant
    ));
    lines.push(format!(
        "Average Participants per Event,{:.1}",
        report.average_participants_per_event
    ));
    lines.push(String::new());

    lines.push("Events".to_string());
    lines.push("Event Name,Date,Hours,Participants,Location".to_string());
    for event in &report.per_event_breakdown {
        lines.push(format!(
            "{},{},{},{},{}",
            csv_field(&event.name),
            display_date(&event.date),
            event.scheduled_duration_hours,
            event.participants,
            csv_field(&event.location)
        ));
    }

    if !report.per_user_summaries.is_empty() {
        lines.push(String::new());
        lines.push("Individual Volunteers".to_string());
        lines.push("Name,Email,Events,Total Hours".to_string());
        for user in &report.per_user_summaries {
            let name = user.display_name.as_deref().unwrap_or("");
            let email = user.email.as_deref().unwrap_or(&user.user_id);
            lines.push(format!(
                "{},{},{},{:.1}",
                csv_field(name),
                csv_field(email),
                user.total_events_attended,
                user.total_hours
            ));
        }
    }

    if !report.group_summaries.is_empty() {
        lines.push(String::new());
        lines.push("Group Attendance".to_string());
        lines.push("Group Name,Events,Participants,Total Hours".to_string());
        for group in &report.group_summaries {
            lines.push(format!(
                "{},{},{},{:.1}",
                csv_field(&group.group_label),
                group.total_events_attended,
                group.total_participants,
                group.total_hours
            ));
        }
    }

    lines.join("\n")
}

// A4 page layout constants (mm)
const PAGE_WIDTH: f64 = 210.0;
const PAGE_HEIGHT: f64 = 297.0;
const MARGIN_LEFT: f64 = 20.0;
const TOP_Y: f64 = 277.0;
const BOTTOM_Y: f64 = 20.0;
const LINE_HEIGHT: f64 = 5.5;

/// Cursor-based text writer that adds pages as content overflows, so
/// long reports are paginated rather than truncated.
struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    y: f64,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);

        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;

        Ok(Self {
            doc,
            layer,
            font,
            font_bold,
            y: TOP_Y,
        })
    }

    fn ensure_space(&mut self, needed: f64) {
        if self.y - needed < BOTTOM_Y {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP_Y;
        }
    }

    fn text_at(&self, text: &str, size: f64, x: f64, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn line(&mut self, text: &str, size: f64, bold: bool) {
        self.ensure_space(LINE_HEIGHT);
        self.text_at(text, size, MARGIN_LEFT, bold);
        self.y -= LINE_HEIGHT;
    }

    /// One table row with cells at fixed x offsets from the left margin.
    fn row(&mut self, cells: &[(f64, &str)], bold: bool) {
        self.ensure_space(LINE_HEIGHT);
        for (offset, text) in cells {
            self.text_at(text, 9.0, MARGIN_LEFT + offset, bold);
        }
        self.y -= LINE_HEIGHT;
    }

    fn heading(&mut self, text: &str) {
        self.ensure_space(LINE_HEIGHT * 3.0);
        self.y -= LINE_HEIGHT * 0.5;
        self.text_at(text, 13.0, MARGIN_LEFT, true);
        self.y -= LINE_HEIGHT * 1.5;
    }

    fn gap(&mut self, mm: f64) {
        self.y -= mm;
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        let mut buffer = Vec::new();
        {
            let mut writer = BufWriter::new(&mut buffer);
            self.doc
                .save(&mut writer)
                .map_err(|e| ExportError::Pdf(e.to_string()))?;
        }
        Ok(buffer)
    }
}

/// Render the organization report as a paginated PDF: banner, summary
/// metrics, and the events / per-user / per-group tables.
pub fn org_report_pdf(report: &OrgReportResult) -> Result<Vec<u8>, ExportError> {
    let mut pdf = PdfWriter::new("Organization Report")?;

    pdf.line("Organization Report", 18.0, true);
    pdf.gap(2.0);
    pdf.line(&report.org.name, 14.0, true);
    if let Some(ref tax_id) = report.org.tax_id {
        pdf.line(&format!("Tax ID: {}", tax_id), 10.0, false);
    }
    pdf.line(
        &format!(
            "Report Period: {} - {}",
            display_date(&report.date_range.from),
            display_date(&report.date_range.to)
        ),
        10.0,
        false,
    );
    pdf.line(
        &format!("Generated: {}", Utc::now().format("%Y-%m-%d %H:%M UTC")),
        9.0,
        false,
    );

    pdf.heading("Summary Metrics");
    pdf.line(&format!("Total Events: {}", report.total_events), 10.0, false);
    pdf.line(
        &format!("Total Participants: {}", report.total_participants),
        10.0,
        false,
    );
    pdf.line(&format!("Total Hours: {:.1}", report.total_hours), 10.0, false);
    pdf.line(
        &format!(
            "Average Hours per Participant: {:.2}",
            report.average_hours_per_participant
        ),
        10.0,
        false,
    );
    pdf.line(
        &format!(
            "Average Participants per Event: {:.1}",
            report.average_participants_per_event
        ),
        10.0,
        false,
    );

    pdf.heading("Events");
    pdf.row(
        &[
            (0.0, "Event"),
            (70.0, "Date"),
            (95.0, "Hours"),
            (115.0, "Participants"),
            (140.0, "Location"),
        ],
        true,
    );
    for event in &report.per_event_breakdown {
        let date = display_date(&event.date);
        let hours = format!("{}", event.scheduled_duration_hours);
        let participants = event.participants.to_string();
        pdf.row(
            &[
                (0.0, event.name.as_str()),
                (70.0, date.as_str()),
                (95.0, hours.as_str()),
                (115.0, participants.as_str()),
                (140.0, event.location.as_str()),
            ],
            false,
        );
    }

    if !report.per_user_summaries.is_empty() {
        pdf.heading("Individual Volunteers");
        pdf.row(
            &[(0.0, "Volunteer"), (80.0, "Events"), (110.0, "Total Hours")],
            true,
        );
        for user in &report.per_user_summaries {
            let label = user
                .display_name
                .as_deref()
                .or(user.email.as_deref())
                .unwrap_or(&user.user_id);
            let events = user.total_events_attended.to_string();
            let hours = format!("{:.1}", user.total_hours);
            pdf.row(
                &[(0.0, label), (80.0, events.as_str()), (110.0, hours.as_str())],
                false,
            );
        }
    }

    if !report.group_summaries.is_empty() {
        pdf.heading("Group Attendance");
        pdf.row(
            &[
                (0.0, "Group"),
                (80.0, "Events"),
                (105.0, "Participants"),
                (135.0, "Total Hours"),
            ],
            true,
        );
        for group in &report.group_summaries {
            let events = group.total_events_attended.to_string();
            let participants = group.total_participants.to_string();
            let hours = format!("{:.1}", group.total_hours);
            pdf.row(
                &[
                    (0.0, group.group_label.as_str()),
                    (80.0, events.as_str()),
                    (105.0, participants.as_str()),
                    (135.0, hours.as_str()),
                ],
                false,
            );
        }
    }

    pdf.finish()
}

/// Greedy word wrap for letter body text. `use_text` does not wrap on
/// its own.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Render the standalone volunteer verification letter.
pub fn volunteer_letter_pdf(data: &VolunteerLetterData) -> Result<Vec<u8>, ExportError> {
    let mut pdf = PdfWriter::new("Volunteer Verification Letter")?;

    pdf.line("Peak Impact", 16.0, true);
    pdf.line(&Utc::now().format("%B %-d, %Y").to_string(), 10.0, false);
    pdf.gap(10.0);

    pdf.line("To whom it may concern,", 10.0, false);
    pdf.gap(4.0);

    let from = display_date(&data.date_range.from);
    let to = display_date(&data.date_range.to);

    let confirmation = format!(
        "I am pleased to confirm that {} has completed {:.1} hours of community service \
         with {} between {} and {}.",
        data.volunteer_name, data.total_hours, data.organization.name, from, to
    );
    for line in wrap_text(&confirmation, 95) {
        pdf.line(&line, 10.0, false);
    }
    pdf.gap(4.0);

    if let Some(ref description) = data.organization.description {
        for line in wrap_text(description, 95) {
            pdf.line(&line, 10.0, false);
        }
        pdf.gap(4.0);
    }

    if let Some(ref email) = data.organization.email {
        let contact = format!(
            "If you have any questions, please reach out by email to {}.",
            email
        );
        for line in wrap_text(&contact, 95) {
            pdf.line(&line, 10.0, false);
        }
        pdf.gap(4.0);
    }

    pdf.line("Best,", 10.0, false);
    pdf.gap(8.0);
    pdf.line(&format!("{} Administrator", data.organization.name), 10.0, true);
    pdf.line("Volunteer Coordinator", 10.0, false);

    pdf.heading("Volunteer Hours Details");
    pdf.line(&format!("Dates: {} - {}", from, to), 10.0, false);
    pdf.line(&format!("Total Time: {:.1} hours", data.total_hours), 10.0, false);
    pdf.gap(4.0);

    pdf.row(&[(0.0, "Activity"), (95.0, "Date"), (135.0, "Duration")], true);
    for event in &data.events {
        let date = display_date(&event.date);
        let duration = duration_label(event.duration_hours);
        pdf.row(
            &[
                (0.0, event.name.as_str()),
                (95.0, date.as_str()),
                (135.0, duration.as_str()),
            ],
            false,
        );
    }

    pdf.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DateRange, GroupSummary, LetterEvent, LetterOrganization, Organization, PerUserSummary,
        ReportEvent,
    };

    fn sample_report() -> OrgReportResult {
        OrgReportResult {
            org: Organization {
                id: "org-1".to_string(),
                name: "Mountain View High School".to_string(),
                tax_id: Some("12-3456789".to_string()),
                admin_user_ids: vec![],
            },
            date_range: DateRange {
                from: "2025-11-01T00:00:00Z".parse().unwrap(),
                to: "2025-12-31T00:00:00Z".parse().unwrap(),
            },
            total_events: 2,
            total_participants: 27,
            total_hours: 82.0,
            average_hours_per_participant: 82.0 / 27.0,
            average_participants_per_event: 13.5,
            per_event_breakdown: vec![ReportEvent {
                id: "event-1".to_string(),
                name: "Beach Cleanup, Fall Edition".to_string(),
                date: "2025-11-15T09:00:00Z".parse().unwrap(),
                scheduled_duration_hours: 3.0,
                participants: 26,
                location: "Ocean Beach".to_string(),
                capacity: 50,
            }],
            per_user_summaries: vec![PerUserSummary {
                user_id: "u1".to_string(),
                display_name: None,
                email: Some("john.doe@example.com".to_string()),
                total_hours: 7.0,
                total_events_attended: 2,
            }],
            group_summaries: vec![GroupSummary {
                group_label: "Section A".to_string(),
                total_participants: 25,
                total_hours: 75.0,
                total_events_attended: 1,
            }],
        }
    }

    #[test]
    fn test_csv_summary_block_layout() {
        let csv = org_report_csv(&sample_report());
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Organization Report");
        assert_eq!(lines[1], "Organization,Mountain View High School");
        assert_eq!(lines[2], "Tax ID,12-3456789");
        assert_eq!(lines[3], "Report Period,2025-11-01 - 2025-12-31");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "Summary Metrics");
        assert_eq!(lines[6], "Total Events,2");
        assert_eq!(lines[7], "Total Participants,27");
        assert_eq!(lines[8], "Total Hours,82.0");
        assert_eq!(lines[9], "Average Hours per Participant,3.04");
        assert_eq!(lines[10], "Average Participants per Event,13.5");
    }

    #[test]
    fn test_csv_quotes_fields_with_commas() {
        let csv = org_report_csv(&sample_report());
        assert!(csv.contains("\"Beach Cleanup, Fall Edition\""));
        assert!(csv.contains(",Ocean Beach"));
    }

    #[test]
    fn test_csv_omits_empty_sections() {
        let mut report = sample_report();
        report.per_user_summaries.clear();
        report.group_summaries.clear();
        let csv = org_report_csv(&report);
        assert!(!csv.contains("Individual Volunteers"));
        assert!(!csv.contains("Group Attendance"));
    }

    #[test]
    fn test_csv_user_row_falls_back_to_user_id() {
        let mut report = sample_report();
        report.per_user_summaries[0].email = None;
        let csv = org_report_csv(&report);
        assert!(csv.lines().any(|l| l == ",u1,2,7.0"));
    }

    #[test]
    fn test_csv_field_escapes_quotes() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_duration_label() {
        assert_eq!(duration_label(3.0), "3 hr");
        assert_eq!(duration_label(3.5), "3 hr 30 min");
        assert_eq!(duration_label(0.25), "0 hr 15 min");
        // Rounding up past the hour carries over
        assert_eq!(duration_label(1.9999), "2 hr");
    }

    #[test]
    fn test_filename_slug() {
        assert_eq!(
            filename_slug("Mountain View  High School"),
            "Mountain-View-High-School"
        );
    }

    #[test]
    fn test_org_report_pdf_produces_pdf_bytes() {
        let bytes = org_report_pdf(&sample_report()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_letter_pdf_produces_pdf_bytes() {
        let data = VolunteerLetterData {
            volunteer_name: "John Doe".to_string(),
            organization: LetterOrganization {
                name: "Mountain View High School".to_string(),
                email: Some("admin@mvhs.example.org".to_string()),
                description: None,
            },
            date_range: DateRange {
                from: "2025-11-01T00:00:00Z".parse().unwrap(),
                to: "2025-12-31T00:00:00Z".parse().unwrap(),
            },
            total_hours: 7.0,
            events: vec![LetterEvent {
                name: "Beach Cleanup".to_string(),
                date: "2025-11-15T09:00:00Z".parse().unwrap(),
                duration_hours: 3.5,
            }],
        };

        let bytes = volunteer_letter_pdf(&data).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_wrap_text_respects_limit() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
    }

    #[test]
    fn test_json_export_is_identity_serialization() {
        let report = sample_report();
        let bytes = export_org_report(&report, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["totalEvents"], 2);
        assert_eq!(value["org"]["name"], "Mountain View High School");
        // Dates serialize as ISO-8601
        assert_eq!(value["dateRange"]["from"], "2025-11-01T00:00:00Z");
    }
}
