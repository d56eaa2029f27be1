//! Attachment records as returned by the Tainacan attachments endpoint.
//!
//! The endpoint is not strict about field shapes: titles and GUIDs come back
//! either as plain strings or as WordPress `{ "rendered": .., "raw": .. }`
//! objects, and some installs expose only the `post_*` columns. Parsing is
//! therefore done by hand from a [`serde_json::Value`].

use serde::Serialize;
use serde_json::Value;

/// Display name used when an attachment carries no name-like field at all.
pub const UNKNOWN_ATTACHMENT_NAME: &str = "Unknown";

/// Name-like fields of one attachment. Ephemeral, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Attachment {
    pub id: Option<i64>,
    pub filename: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub guid: Option<String>,
    pub url: Option<String>,
    pub post_title: Option<String>,
    pub post_name: Option<String>,
}

impl Attachment {
    /// Build an attachment from one entry of the API's JSON array.
    ///
    /// Returns `None` for entries that are not JSON objects; those are
    /// skipped by the checker.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| obj.get(key).and_then(text_of);

        Some(Self {
            id: obj.get("id").and_then(|v| {
                v.as_i64()
                    .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
            }),
            filename: text("filename"),
            title: text("title"),
            name: text("name"),
            guid: text("guid"),
            url: text("url"),
            post_title: text("post_title"),
            post_name: text("post_name"),
        })
    }

    /// All non-empty name-like values, in matching priority order.
    ///
    /// GUIDs and URLs contribute only their last path segment.
    pub fn name_candidates(&self) -> Vec<String> {
        let ordered = [
            self.filename.as_deref(),
            self.title.as_deref(),
            self.name.as_deref(),
            self.guid.as_deref().map(basename),
            self.url.as_deref().map(basename),
            self.post_title.as_deref(),
            self.post_name.as_deref(),
        ];

        ordered
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The name reported for this attachment in results and invalid lists.
    pub fn primary_name(&self) -> String {
        self.name_candidates()
            .into_iter()
            .next()
            .unwrap_or_else(|| UNKNOWN_ATTACHMENT_NAME.to_string())
    }
}

/// Parse a whole attachments array, dropping non-object entries.
pub fn attachments_from_values(values: &[Value]) -> Vec<Attachment> {
    values.iter().filter_map(Attachment::from_value).collect()
}

/// Extract display text from a string or a `{rendered, raw}` object.
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj
            .get("rendered")
            .or_else(|| obj.get("raw"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Last path segment of a URL or path, ignoring trailing slashes.
pub fn basename(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}
