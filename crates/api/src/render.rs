//! HTML fragments returned alongside JSON results for the admin screens.
//!
//! Every interpolated value goes through [`escape_html`].

use std::fmt::Write;

use doccheck_core::check::{BatchItem, BatchResult, CheckResult, CheckStatus};
use doccheck_core::template::escape_html;
use doccheck_db::models::document_check::DocumentCheck;
use doccheck_db::models::email_log::EmailLog;

const DATE_TIME_FORMAT: &str = "%B %-d, %Y %-I:%M %P";

/// Attachment names listed per batch row before truncating.
const BATCH_FILES_SHOWN: usize = 3;

/// Escaped value with its first letter upper-cased.
fn badge_label(value: &str) -> String {
    let mut label = value.to_string();
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    escape_html(&label)
}

fn badge(status: &str) -> String {
    format!(
        r#"<span class="tcd-status-badge tcd-status-{}">{}</span>"#,
        escape_html(status),
        badge_label(status)
    )
}

/// A headed list block; `footer` is appended inside the block. Nothing is
/// written for an empty list.
fn list_section(
    out: &mut String,
    class: &str,
    heading: &str,
    item_class: &str,
    values: &[String],
    footer: &str,
) {
    if values.is_empty() {
        return;
    }
    let _ = write!(out, r#"<div class="{class}"><h4>{heading}</h4><ul>"#);
    for value in values {
        let _ = write!(out, r#"<li class="{item_class}">{}</li>"#, escape_html(value));
    }
    out.push_str("</ul>");
    out.push_str(footer);
    out.push_str("</div>");
}

// ---------------------------------------------------------------------------
// Single item
// ---------------------------------------------------------------------------

pub fn single_result(result: &CheckResult, email_enabled: bool) -> String {
    let mut out = String::new();
    let status = result.status.as_str();

    let _ = write!(
        out,
        r#"<div class="tcd-result tcd-status-{status}"><h3>Check Result</h3>
<div class="tcd-result-summary">
<p><strong>Item ID:</strong> {}</p>
<p><strong>Status:</strong> {}</p>
<p><strong>Total Attachments:</strong> {}</p></div>"#,
        result.item_id,
        badge(status),
        result.total_attachments
    );

    list_section(
        &mut out,
        "tcd-attachment-files",
        "Attachment Files",
        "",
        &result.attachment_files,
        "",
    );
    list_section(
        &mut out,
        "tcd-found-documents",
        "Matched Required Documents",
        "tcd-doc-found",
        &result.found_documents,
        "",
    );
    list_section(
        &mut out,
        "tcd-missing-documents",
        "Missing Documents",
        "tcd-doc-missing",
        &result.missing_documents,
        "",
    );
    list_section(
        &mut out,
        "tcd-invalid-documents",
        "Invalid Documents",
        "tcd-doc-missing",
        &result.invalid_documents,
        r#"<p class="description">These documents do not match any required document names and should be removed or renamed.</p>"#,
    );

    if email_enabled && result.status == CheckStatus::Incomplete {
        let _ = write!(
            out,
            r#"<div class="tcd-email-actions" data-item-id="{id}"><h4>Email Notification</h4>
<button type="button" class="button button-secondary tcd-send-email" data-item-id="{id}">Send Email to User</button></div>"#,
            id = result.item_id
        );
    }

    if let Some(debug) = &result.debug {
        let pretty = serde_json::to_string_pretty(debug).unwrap_or_default();
        let _ = write!(
            out,
            r#"<div class="tcd-debug"><h4>Debug Information</h4><pre>{}</pre></div>"#,
            escape_html(&pretty)
        );
    }

    out.push_str("</div>");
    out
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

fn attachment_cell(item: &BatchItem) -> String {
    if item.attachment_files.is_empty() {
        return "<small>No attachments</small>".to_string();
    }
    let total = item.attachment_files.len();
    let shown: Vec<String> = item
        .attachment_files
        .iter()
        .take(BATCH_FILES_SHOWN)
        .map(|file| {
            let invalid = item.invalid_documents.iter().any(|i| i == file);
            let class = if invalid { "tcd-file-invalid" } else { "tcd-file-valid" };
            format!(r#"<span class="{class}">{}</span>"#, escape_html(file))
        })
        .collect();

    let mut cell = format!("<small>{}", shown.join(", "));
    if total > BATCH_FILES_SHOWN {
        let _ = write!(cell, " ... ({total} total)");
    }
    cell.push_str("</small>");
    cell
}

fn issues_cell(item: &BatchItem) -> String {
    let mut parts = Vec::new();
    if !item.missing_documents.is_empty() {
        parts.push(format!(
            r#"<strong>Missing:</strong> <span class="tcd-doc-missing">{}</span>"#,
            escape_html(&item.missing_documents.join(", "))
        ));
    }
    if !item.invalid_documents.is_empty() {
        parts.push(format!(
            r#"<strong>Invalid:</strong> <span class="tcd-doc-missing">{}</span>"#,
            escape_html(&item.invalid_documents.join(", "))
        ));
    }
    if let Some(message) = &item.message {
        parts.push(format!(
            r#"<span class="tcd-doc-error">{}</span>"#,
            escape_html(message)
        ));
    }
    if parts.is_empty() {
        return r#"<span class="tcd-doc-found">✓ All documents valid</span>"#.to_string();
    }
    parts.join("<br>")
}

pub fn batch_result(result: &BatchResult) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<div class="tcd-batch-result"><h3>Batch Check Results</h3>
<div class="tcd-batch-summary"><p>Page {} of {} (Total items: {})</p>
<div class="tcd-summary-stats">
<span class="tcd-stat tcd-stat-complete">Complete: {}</span> 
<span class="tcd-stat tcd-stat-incomplete">Incomplete: {}</span> 
<span class="tcd-stat tcd-stat-error">Errors: {}</span></div></div>"#,
        result.page,
        result.total_pages,
        result.total_items,
        result.summary.complete,
        result.summary.incomplete,
        result.summary.error
    );

    if result.items_checked.is_empty() {
        out.push_str(
            r#"<div class="notice notice-warning"><p>No items were processed in this batch. This might be due to:</p>
<ul><li>- Invalid collection ID</li><li>- Empty collection</li><li>- API connection issues</li>
<li>- Incorrect API URL configuration</li></ul>
<p>Please check the plugin settings and enable debug mode for more information.</p></div></div>"#,
        );
        return out;
    }

    out.push_str(
        r#"<table class="wp-list-table widefat fixed striped"><thead><tr>
<th>Item ID</th><th>Title</th><th>Status</th><th>Attachments</th><th>Missing/Invalid Documents</th>
</tr></thead><tbody>"#,
    );
    for item in &result.items_checked {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            item.id,
            escape_html(&item.title),
            badge(item.status.as_str()),
            attachment_cell(item),
            issues_cell(item)
        );
    }
    out.push_str("</tbody></table></div>");
    out
}

// ---------------------------------------------------------------------------
// History and email log
// ---------------------------------------------------------------------------

pub fn history(records: &[DocumentCheck]) -> String {
    let mut out = String::from(r#"<div class="tcd-history-result"><h3>Check History</h3>"#);
    if records.is_empty() {
        out.push_str("<p>No history found for this item.</p></div>");
        return out;
    }

    out.push_str(
        r#"<table class="wp-list-table widefat fixed striped"><thead><tr>
<th>Date</th><th>Status</th><th>Missing Documents</th></tr></thead><tbody>"#,
    );
    for record in records {
        let missing = if record.missing_documents.0.is_empty() {
            "-".to_string()
        } else {
            escape_html(&record.missing_documents.0.join(", "))
        };
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            record.check_date.format(DATE_TIME_FORMAT),
            badge(&record.status),
            missing
        );
    }
    out.push_str("</tbody></table></div>");
    out
}

pub fn email_logs(logs: &[EmailLog]) -> String {
    if logs.is_empty() {
        return "<p>No email logs found.</p>".to_string();
    }

    let mut out = String::from(
        r#"<table class="wp-list-table widefat fixed striped tcd-email-logs"><thead><tr>
<th>Date</th><th>User</th><th>Item</th><th>Type</th><th>Subject</th><th>Status</th>
</tr></thead><tbody>"#,
    );
    for log in logs {
        let item = if log.item_id == 0 {
            "-".to_string()
        } else {
            format!("Item #{}", log.item_id)
        };
        let mut status = badge(&log.status);
        if let Some(error) = &log.error_message {
            let _ = write!(status, "<br><small>{}</small>", escape_html(error));
        }
        let _ = write!(
            out,
            "<tr><td>{}</td><td>User #{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            log.sent_date.format(DATE_TIME_FORMAT),
            log.user_id,
            item,
            badge_label(&log.email_type),
            escape_html(&log.subject),
            status
        );
    }
    out.push_str("</tbody></table>");
    out
}

/// Owner-facing status panel for the latest recorded check.
pub fn doc_status(record: &DocumentCheck) -> String {
    let mut out = format!(
        r#"<div class="tcd-doc-status tcd-status-{}"><h3 class="tcd-doc-status-title">Document Verification Status</h3><div class="tcd-status-summary"><strong>{}</strong></div>"#,
        escape_html(&record.status),
        badge_label(&record.status)
    );

    for (heading, class, values) in [
        ("Valid Documents Found", "tcd-doc-present", &record.found_documents.0),
        ("Missing Documents", "tcd-doc-missing", &record.missing_documents.0),
        ("Invalid Documents", "tcd-doc-missing", &record.invalid_documents.0),
    ] {
        if values.is_empty() {
            continue;
        }
        let _ = write!(out, r#"<div class="tcd-doc-section"><h4>{heading}</h4><ul class="tcd-doc-list">"#);
        for value in values {
            let _ = write!(out, r#"<li class="{class}">{}</li>"#, escape_html(value));
        }
        out.push_str("</ul></div>");
    }

    if record.check_status() == Some(CheckStatus::Incomplete) {
        let action = match (
            record.missing_documents.0.is_empty(),
            record.invalid_documents.0.is_empty(),
        ) {
            (false, false) => "Please upload the missing documents and remove or rename the invalid ones.",
            (false, true) => "Please upload the missing documents.",
            _ => "Please remove or rename the invalid documents.",
        };
        let _ = write!(
            out,
            r#"<div class="tcd-missing-notice"><p><strong>Action Required:</strong> {action}</p></div>"#
        );
    }

    let _ = write!(
        out,
        r#"<p class="tcd-last-check"><small>Last checked: {}</small></p></div>"#,
        record.check_date.format(DATE_TIME_FORMAT)
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use doccheck_core::check::BatchSummary;

    fn incomplete() -> CheckResult {
        CheckResult {
            item_id: 42,
            status: CheckStatus::Incomplete,
            found_documents: vec!["documento_identidade".into()],
            missing_documents: vec!["comprovante_endereco".into()],
            invalid_documents: vec!["<script>.pdf".into()],
            attachment_files: vec!["DOC_IDENTIDADE.pdf".into(), "<script>.pdf".into()],
            total_attachments: 2,
            check_date: Utc::now(),
            message: None,
            debug: None,
        }
    }

    #[test]
    fn single_result_escapes_names() {
        let html = single_result(&incomplete(), false);
        assert!(html.contains("tcd-status-incomplete"));
        assert!(html.contains("&lt;script&gt;.pdf"));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("tcd-email-actions"));
    }

    #[test]
    fn single_result_offers_email_when_enabled() {
        let html = single_result(&incomplete(), true);
        assert!(html.contains(r#"data-item-id="42""#));
    }

    #[test]
    fn empty_batch_shows_warning() {
        let result = BatchResult {
            collection_id: 1,
            page: 1,
            per_page: 20,
            total_items: 0,
            total_pages: 0,
            items_checked: Vec::new(),
            summary: BatchSummary::default(),
            check_date: Utc::now(),
        };
        let html = batch_result(&result);
        assert!(html.contains("No items were processed"));
        assert!(html.contains("Page 1 of 0"));
    }

    #[test]
    fn batch_rows_truncate_long_attachment_lists() {
        let mut item = BatchItem::from_result("Ficha & Cia", incomplete());
        item.attachment_files = (1..=5).map(|i| format!("f{i}.pdf")).collect();
        let cell = attachment_cell(&item);
        assert!(cell.contains("f3.pdf"));
        assert!(!cell.contains("f4.pdf"));
        assert!(cell.contains("(5 total)"));
    }

    #[test]
    fn badge_capitalizes_status() {
        assert!(badge("complete").contains(">Complete<"));
    }

    #[test]
    fn email_log_rows_mark_batch_messages() {
        let log = EmailLog {
            id: 1,
            user_id: 12,
            item_id: 0,
            email_type: "batch".into(),
            subject: "Multiple <Documents>".into(),
            status: "failed".into(),
            sent_date: Utc::now(),
            error_message: Some("relay refused".into()),
        };
        let html = email_logs(&[log]);
        assert!(html.contains("User #12"));
        assert!(html.contains("<td>-</td>"));
        assert!(html.contains("Multiple &lt;Documents&gt;"));
        assert!(html.contains("relay refused"));
        assert_eq!(email_logs(&[]), "<p>No email logs found.</p>");
    }
}
