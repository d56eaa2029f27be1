//! Notification subject/body templates and placeholder substitution.
//!
//! Templates use `{name}` placeholders. Substitution is a single left-to-right
//! pass, so placeholder-looking text inside a substituted value is never
//! expanded again. Unknown placeholders are left as written.

use crate::check::CheckResult;
use crate::types::{DbId, Timestamp};

pub const DEFAULT_SINGLE_SUBJECT: &str = "Document Verification Required - {item_title}";

pub const DEFAULT_SINGLE_BODY: &str = "Hello {user_name},

Your document verification for item '{item_title}' requires attention.

Missing Documents: {missing_documents}
Invalid Documents: {invalid_documents}

Please log in to your account and upload the required documents:
{item_url}

If you have any questions, please contact our support team.

Best regards,
{site_name}
{site_url}";

pub const DEFAULT_BATCH_SUBJECT: &str = "Multiple Documents Require Verification";

pub const DEFAULT_BATCH_BODY: &str = "Hello {user_name},

You have {total_items} items that require document verification:

{items_list}

Please log in to your account and upload the required documents.

If you have any questions, please contact our support team.

Best regards,
{site_name}
{site_url}";

pub const TEST_EMAIL_SUBJECT: &str = "Tainacan Document Checker - SMTP Test";

pub const TEST_EMAIL_BODY: &str =
    "This is a test email to verify your SMTP configuration is working correctly.";

/// Rendering of an empty document list.
const NONE_LABEL: &str = "None";

const DATE_FORMAT: &str = "%B %-d, %Y";
const TIME_FORMAT: &str = "%-I:%M %P";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Site identity shown in every message.
#[derive(Debug, Clone, Default)]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
}

/// The person a message is addressed to.
#[derive(Debug, Clone, Copy)]
pub struct Recipient<'a> {
    pub name: &'a str,
    pub email: &'a str,
}

/// One line group of a batch message's `{items_list}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedItem {
    pub id: DbId,
    pub title: String,
    pub url: String,
    pub missing_documents: Vec<String>,
    pub invalid_documents: Vec<String>,
}

// ---------------------------------------------------------------------------
// Placeholder sets
// ---------------------------------------------------------------------------

/// Ordered placeholder name/value pairs.
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    values: Vec<(&'static str, String)>,
}

impl Placeholders {
    pub fn set(&mut self, name: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    fn common(recipient: Recipient<'_>, site: &SiteInfo, now: Timestamp) -> Self {
        let mut p = Self::default();
        p.set("user_name", recipient.name);
        p.set("user_email", recipient.email);
        p.set("site_name", site.name.as_str());
        p.set("site_url", site.url.as_str());
        p.set("date", now.format(DATE_FORMAT).to_string());
        p.set("time", now.format(TIME_FORMAT).to_string());
        p
    }

    /// Values for a single-item notification.
    pub fn single(
        recipient: Recipient<'_>,
        item_title: &str,
        item_url: &str,
        result: &CheckResult,
        site: &SiteInfo,
        now: Timestamp,
    ) -> Self {
        let mut p = Self::common(recipient, site, now);
        p.set("item_title", item_title);
        p.set("item_id", result.item_id.to_string());
        p.set("item_url", item_url);
        p.set("missing_documents", join_or_none(&result.missing_documents));
        p.set("invalid_documents", join_or_none(&result.invalid_documents));
        p.set("found_documents", join_or_none(&result.found_documents));
        p
    }

    /// Values for a grouped notification listing several items.
    pub fn batch(
        recipient: Recipient<'_>,
        items: &[ListedItem],
        collection_id: Option<DbId>,
        site: &SiteInfo,
        now: Timestamp,
    ) -> Self {
        let mut p = Self::common(recipient, site, now);
        p.set("total_items", items.len().to_string());
        p.set("items_list", format_items_list(items));
        p.set(
            "collection_id",
            collection_id.map(|c| c.to_string()).unwrap_or_default(),
        );
        p
    }
}

fn join_or_none(list: &[String]) -> String {
    if list.is_empty() {
        NONE_LABEL.to_string()
    } else {
        list.join(", ")
    }
}

/// Plain-text item listing for batch messages.
pub fn format_items_list(items: &[ListedItem]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(&format!("• {} (ID: {})\n", item.title, item.id));
        if !item.missing_documents.is_empty() {
            out.push_str(&format!("  Missing: {}\n", item.missing_documents.join(", ")));
        }
        if !item.invalid_documents.is_empty() {
            out.push_str(&format!("  Invalid: {}\n", item.invalid_documents.join(", ")));
        }
        if !item.url.is_empty() {
            out.push_str(&format!("  Edit: {}\n", item.url));
        }
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Substitute placeholders into a subject line. Never escaped.
pub fn render_subject(template: &str, values: &Placeholders) -> String {
    substitute(template, values, false)
}

/// Substitute placeholders into a message body.
///
/// In HTML mode values are escaped, and a template without any markup gets
/// its newlines converted to `<br>` so plain-text templates still read well.
pub fn render_body(template: &str, values: &Placeholders, html: bool) -> String {
    let rendered = substitute(template, values, html);
    if html && !looks_like_html(template) {
        rendered.replace("\r\n", "\n").replace('\n', "<br>\n")
    } else {
        rendered
    }
}

fn substitute(template: &str, values: &Placeholders, escape: bool) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if after[..close].contains('{') => {
                out.push('{');
                rest = after;
            }
            Some(close) => {
                let name = &after[..close];
                match values.get(name) {
                    Some(v) if escape => out.push_str(&escape_html(v)),
                    Some(v) => out.push_str(v),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn looks_like_html(template: &str) -> bool {
    template
        .as_bytes()
        .windows(2)
        .any(|w| w[0] == b'<' && (w[1].is_ascii_alphabetic() || w[1] == b'/'))
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
