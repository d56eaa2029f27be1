//! Check results and the attachment evaluation rules.
//!
//! [`evaluate_attachments`] is the decision half of the single-item check:
//! the caller fetches attachments and persists the outcome, this module only
//! classifies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attachment::Attachment;
use crate::matcher::document_matches;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const STATUS_COMPLETE: &str = "complete";
pub const STATUS_INCOMPLETE: &str = "incomplete";
pub const STATUS_ERROR: &str = "error";

/// All valid check status strings.
pub const VALID_STATUSES: &[&str] = &[STATUS_COMPLETE, STATUS_INCOMPLETE, STATUS_ERROR];

/// History rows written by a direct single-item check.
pub const CHECK_TYPE_INDIVIDUAL: &str = "individual";

/// History rows written while walking a collection page.
pub const CHECK_TYPE_BATCH: &str = "batch";

/// Default number of items per batch page.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Upper bound on items per batch page.
pub const MAX_PER_PAGE: u32 = 100;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Outcome of checking one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Complete,
    Incomplete,
    Error,
}

impl CheckStatus {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            STATUS_COMPLETE => Ok(Self::Complete),
            STATUS_INCOMPLETE => Ok(Self::Incomplete),
            STATUS_ERROR => Ok(Self::Error),
            _ => Err(format!(
                "Invalid check status '{s}'. Must be one of: {}",
                VALID_STATUSES.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => STATUS_COMPLETE,
            Self::Incomplete => STATUS_INCOMPLETE,
            Self::Error => STATUS_ERROR,
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Single-item result
// ---------------------------------------------------------------------------

/// Result of verifying one item's attachments against the required tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub item_id: DbId,
    pub status: CheckStatus,
    pub found_documents: Vec<String>,
    pub missing_documents: Vec<String>,
    pub invalid_documents: Vec<String>,
    pub attachment_files: Vec<String>,
    pub total_attachments: usize,
    pub check_date: Timestamp,
    /// Transport or decode failure text, only for [`CheckStatus::Error`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Raw request/attachment details, only when debug mode is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

impl CheckResult {
    /// Result for an item whose attachments could not be fetched.
    pub fn error(item_id: DbId, message: impl Into<String>, now: Timestamp) -> Self {
        Self {
            item_id,
            status: CheckStatus::Error,
            found_documents: Vec::new(),
            missing_documents: Vec::new(),
            invalid_documents: Vec::new(),
            attachment_files: Vec::new(),
            total_attachments: 0,
            check_date: now,
            message: Some(message.into()),
            debug: None,
        }
    }
}

/// Classify an item's attachments against the required tokens.
///
/// Each attachment is tried against the tokens in configured order and
/// consumes at most one token: the first token any of its name candidates
/// matches. Attachments matching no token are reported as invalid by their
/// primary name, but only when at least one token is configured.
///
/// The status is `complete` iff nothing is missing and nothing is invalid.
pub fn evaluate_attachments(
    item_id: DbId,
    required: &[String],
    attachments: &[Attachment],
    now: Timestamp,
) -> CheckResult {
    if attachments.is_empty() && !required.is_empty() {
        return CheckResult {
            item_id,
            status: CheckStatus::Incomplete,
            found_documents: Vec::new(),
            missing_documents: required.to_vec(),
            invalid_documents: Vec::new(),
            attachment_files: Vec::new(),
            total_attachments: 0,
            check_date: now,
            message: None,
            debug: None,
        };
    }

    let mut found: Vec<String> = Vec::new();
    let mut invalid: Vec<String> = Vec::new();
    let mut files: Vec<String> = Vec::with_capacity(attachments.len());

    for attachment in attachments {
        let candidates = attachment.name_candidates();
        let primary = attachment.primary_name();
        files.push(primary.clone());

        let matched = required.iter().find(|token| {
            candidates
                .iter()
                .any(|candidate| document_matches(candidate, token))
        });

        match matched {
            Some(token) => {
                if !found.contains(token) {
                    found.push(token.clone());
                }
            }
            None if !required.is_empty() => invalid.push(primary),
            None => {}
        }
    }

    let missing: Vec<String> = required
        .iter()
        .filter(|token| !found.contains(token))
        .cloned()
        .collect();

    let status = if missing.is_empty() && invalid.is_empty() {
        CheckStatus::Complete
    } else {
        CheckStatus::Incomplete
    };

    CheckResult {
        item_id,
        status,
        found_documents: found,
        missing_documents: missing,
        invalid_documents: invalid,
        attachment_files: files,
        total_attachments: attachments.len(),
        check_date: now,
        message: None,
        debug: None,
    }
}

// ---------------------------------------------------------------------------
// Batch result
// ---------------------------------------------------------------------------

/// Per-status counters for one batch page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub complete: u32,
    pub incomplete: u32,
    pub error: u32,
}

impl BatchSummary {
    pub fn record(&mut self, status: CheckStatus) {
        match status {
            CheckStatus::Complete => self.complete += 1,
            CheckStatus::Incomplete => self.incomplete += 1,
            CheckStatus::Error => self.error += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.complete + self.incomplete + self.error
    }
}

/// One item's line in a batch result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: DbId,
    pub title: String,
    pub status: CheckStatus,
    pub missing_documents: Vec<String>,
    pub invalid_documents: Vec<String>,
    pub found_documents: Vec<String>,
    pub attachment_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BatchItem {
    pub fn from_result(title: impl Into<String>, result: CheckResult) -> Self {
        Self {
            id: result.item_id,
            title: title.into(),
            status: result.status,
            missing_documents: result.missing_documents,
            invalid_documents: result.invalid_documents,
            found_documents: result.found_documents,
            attachment_files: result.attachment_files,
            message: result.message,
        }
    }
}

/// Aggregated outcome of checking one page of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub collection_id: DbId,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub items_checked: Vec<BatchItem>,
    pub summary: BatchSummary,
    pub check_date: Timestamp,
}

impl BatchResult {
    /// Whether the caller should request the next page.
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }

    /// Percentage of pages processed once this page is done.
    pub fn progress(&self) -> u8 {
        if self.total_pages == 0 {
            return 100;
        }
        let pct = (u64::from(self.page) * 100 / u64::from(self.total_pages)).min(100);
        pct as u8
    }
}

/// Clamp a requested page number to >= 1.
pub fn clamp_page(page: Option<i64>) -> u32 {
    page.unwrap_or(1).clamp(1, i64::from(u32::MAX)) as u32
}

/// Clamp a requested page size to `[1, MAX_PER_PAGE]`.
pub fn clamp_per_page(per_page: Option<i64>) -> u32 {
    per_page
        .unwrap_or(i64::from(DEFAULT_PER_PAGE))
        .clamp(1, i64::from(MAX_PER_PAGE)) as u32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
