//! Lenient parsing of Tainacan and WordPress REST bodies.

use doccheck_core::attachment::text_of;
use doccheck_core::types::DbId;
use serde_json::{Map, Value};

use crate::error::TainacanError;
use crate::source::{ItemInfo, ItemPage, ItemRef, Owner};

/// Keys that may carry an item id in a listing entry, in priority order.
const ITEM_ID_KEYS: &[&str] = &["id", "ID", "item_id"];

/// Meta keys that may link an item to its submitting user.
const OWNER_META_KEYS: &[&str] = &[
    "_ur_user_id",
    "_user_registration_user_id",
    "_tainacan_user_id",
    "_item_author_id",
    "_submitter_id",
    "_tcd_user_id",
];

// ---------------------------------------------------------------------------
// Shared body handling
// ---------------------------------------------------------------------------

fn decode(body: &str) -> Result<Value, TainacanError> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) | Err(_) => Err(TainacanError::Decode),
        Ok(value) => Ok(value),
    }
}

/// Map the error shapes shared by every endpoint.
fn reject_errors(value: &Value) -> Result<(), TainacanError> {
    match value {
        Value::String(s) if s == "rest_forbidden" => Err(TainacanError::Forbidden),
        Value::Object(obj) => match (obj.get("code"), obj.get("message")) {
            (Some(code), Some(message)) => Err(TainacanError::Api {
                code: scalar_text(code).unwrap_or_default(),
                message: scalar_text(message).unwrap_or_default(),
            }),
            _ => Ok(()),
        },
        Value::Array(_) => Ok(()),
        _ => Err(TainacanError::InvalidResponse),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A positive id from a number, a numeric string or a one-element array.
fn positive_id(value: &Value) -> Option<DbId> {
    let id = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Array(list) => list.first().and_then(positive_id),
        _ => None,
    }?;
    (id > 0).then_some(id)
}

fn count_value(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn ceil_pages(total: u64, per_page: u32) -> u32 {
    let per_page = u64::from(per_page.max(1));
    u32::try_from(total.div_ceil(per_page)).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// Parse the body of `GET /items/{id}/attachments`.
///
/// A JSON object that is not an error object is read as a map of
/// attachments and its values are returned.
pub fn parse_attachments(body: &str) -> Result<Vec<Value>, TainacanError> {
    let value = decode(body)?;
    reject_errors(&value)?;
    Ok(match value {
        Value::Array(list) => list,
        Value::Object(obj) => obj.into_iter().map(|(_, v)| v).collect(),
        _ => Vec::new(),
    })
}

// ---------------------------------------------------------------------------
// Collection listing
// ---------------------------------------------------------------------------

/// Pagination totals announced in `X-WP-Total` / `X-WP-TotalPages`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageHeaders {
    pub total: Option<u64>,
    pub total_pages: Option<u32>,
}

/// Parse the body of `GET /collection/{id}/items`.
///
/// Accepts a wrapped `{items, total, total_pages}` object or a bare array
/// (of item objects or raw ids) with totals in the headers. Missing totals
/// fall back to the entry count and `ceil(total / per_page)`.
pub fn parse_item_page(
    body: &str,
    headers: PageHeaders,
    per_page: u32,
) -> Result<ItemPage, TainacanError> {
    let value = decode(body)?;

    let (entries, total, total_pages) = match value {
        Value::Object(mut obj) if obj.contains_key("items") => {
            let entries = match obj.remove("items") {
                Some(Value::Array(list)) => list,
                Some(Value::Object(map)) => map.into_iter().map(|(_, v)| v).collect(),
                _ => Vec::new(),
            };
            let total = count_value(obj.get("total")).unwrap_or(entries.len() as u64);
            let total_pages = count_value(obj.get("total_pages"))
                .map(|p| u32::try_from(p).unwrap_or(u32::MAX))
                .unwrap_or_else(|| ceil_pages(total, per_page));
            (entries, total, total_pages)
        }
        other => {
            reject_errors(&other)?;
            let entries = match other {
                Value::Array(list) => list,
                _ => return Err(TainacanError::InvalidResponse),
            };
            let total = headers.total.unwrap_or(entries.len() as u64);
            let total_pages = headers
                .total_pages
                .unwrap_or_else(|| ceil_pages(total, per_page));
            (entries, total, total_pages)
        }
    };

    let mut page = ItemPage {
        items: Vec::with_capacity(entries.len()),
        unidentified: 0,
        total,
        total_pages,
    };

    for entry in &entries {
        match item_ref(entry) {
            Some(item) => page.items.push(item),
            None => page.unidentified += 1,
        }
    }

    Ok(page)
}

fn item_ref(entry: &Value) -> Option<ItemRef> {
    match entry {
        Value::Object(obj) => {
            let id = ITEM_ID_KEYS
                .iter()
                .find_map(|key| obj.get(*key))
                .and_then(positive_id)?;
            Some(ItemRef {
                id,
                title: item_title(obj, id),
            })
        }
        Value::Number(_) | Value::String(_) => {
            let id = positive_id(entry)?;
            Some(ItemRef {
                id,
                title: default_title(id),
            })
        }
        _ => None,
    }
}

fn item_title(obj: &Map<String, Value>, id: DbId) -> String {
    obj.get("title")
        .or_else(|| obj.get("name"))
        .and_then(text_of)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| default_title(id))
}

pub fn default_title(id: DbId) -> String {
    format!("Item #{id}")
}

// ---------------------------------------------------------------------------
// Single item
// ---------------------------------------------------------------------------

/// Parse the body of `GET /items/{id}`.
pub fn parse_item_info(item_id: DbId, body: &str) -> Result<ItemInfo, TainacanError> {
    let value = decode(body)?;
    reject_errors(&value)?;
    let obj = value.as_object().ok_or(TainacanError::InvalidResponse)?;

    let id = obj.get("id").and_then(positive_id).unwrap_or(item_id);
    let url = obj
        .get("url")
        .or_else(|| obj.get("link"))
        .and_then(text_of)
        .filter(|u| !u.trim().is_empty());

    Ok(ItemInfo {
        id,
        title: item_title(obj, id),
        url,
        collection_id: obj.get("collection_id").and_then(positive_id),
        owner_id: owner_id(obj),
    })
}

/// Post author first, then the known user-link meta keys.
fn owner_id(obj: &Map<String, Value>) -> Option<DbId> {
    if let Some(id) = obj.get("author_id").and_then(positive_id) {
        return Some(id);
    }
    if let Some(author) = obj.get("author") {
        let id = match author {
            Value::Object(a) => a.get("id").and_then(positive_id),
            other => positive_id(other),
        };
        if id.is_some() {
            return id;
        }
    }

    let meta = obj.get("meta").and_then(Value::as_object);
    OWNER_META_KEYS.iter().find_map(|key| {
        obj.get(*key)
            .and_then(positive_id)
            .or_else(|| meta.and_then(|m| m.get(*key)).and_then(positive_id))
    })
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Parse the body of `GET /users/{id}?context=edit`.
///
/// A WordPress "invalid user" error maps to `Ok(None)`.
pub fn parse_owner(body: &str) -> Result<Option<Owner>, TainacanError> {
    let value = decode(body)?;
    match reject_errors(&value) {
        Err(TainacanError::Api { code, .. }) if code == "rest_user_invalid_id" => {
            return Ok(None)
        }
        other => other?,
    }
    let obj = value.as_object().ok_or(TainacanError::InvalidResponse)?;
    let Some(id) = obj.get("id").and_then(positive_id) else {
        return Ok(None);
    };

    let text = |key: &str| obj.get(key).and_then(scalar_text).unwrap_or_default();
    let login = match text("username") {
        s if s.is_empty() => text("slug"),
        s => s,
    };

    Ok(Some(Owner {
        id,
        display_name: text("name"),
        login,
        email: text("email"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn attachments_accept_arrays() {
        let list = parse_attachments(r#"[{"id":1,"filename":"a.pdf"},{"id":2}]"#).unwrap();
        assert_eq!(list.len(), 2);
        assert!(parse_attachments("[]").unwrap().is_empty());
    }

    #[test]
    fn attachment_errors_are_classified() {
        assert_matches!(parse_attachments("<html>"), Err(TainacanError::Decode));
        assert_matches!(parse_attachments("null"), Err(TainacanError::Decode));
        assert_matches!(
            parse_attachments(r#""rest_forbidden""#),
            Err(TainacanError::Forbidden)
        );
        assert_matches!(parse_attachments("42"), Err(TainacanError::InvalidResponse));
        assert_matches!(
            parse_attachments(r#"{"code":"rest_no_route","message":"No route","data":{"status":404}}"#),
            Err(TainacanError::Api { code, message }) if code == "rest_no_route" && message == "No route"
        );
    }

    #[test]
    fn error_messages_are_operator_facing() {
        assert_eq!(TainacanError::Decode.to_string(), "Failed to decode API response");
        assert_eq!(
            TainacanError::Forbidden.to_string(),
            "Access forbidden. The attachments may be private or restricted."
        );
    }

    #[test]
    fn wrapped_page_uses_inline_totals() {
        let body = r#"{"items":[{"id":5,"title":"Ficha"},{"id":"6","title":{"rendered":"Outra"}}],
                       "total":"41","total_pages":3}"#;
        let page = parse_item_page(body, PageHeaders::default(), 20).unwrap();
        assert_eq!(page.total, 41);
        assert_eq!(page.total_pages, 3);
        assert_eq!(
            page.items,
            vec![
                ItemRef { id: 5, title: "Ficha".into() },
                ItemRef { id: 6, title: "Outra".into() },
            ]
        );
    }

    #[test]
    fn wrapped_page_without_totals_counts_entries() {
        let page = parse_item_page(r#"{"items":[{"id":1},{"id":2},{"id":3}]}"#, PageHeaders::default(), 2)
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items[0].title, "Item #1");
    }

    #[test]
    fn bare_array_reads_header_totals() {
        let headers = PageHeaders {
            total: Some(95),
            total_pages: Some(5),
        };
        let page = parse_item_page(r#"[{"ID":10,"name":"Dez"}]"#, headers, 20).unwrap();
        assert_eq!(page.total, 95);
        assert_eq!(page.total_pages, 5);
        assert_eq!(page.items[0], ItemRef { id: 10, title: "Dez".into() });

        let no_headers = parse_item_page(r#"[{"item_id":1},{"item_id":2}]"#, PageHeaders::default(), 1)
            .unwrap();
        assert_eq!(no_headers.total, 2);
        assert_eq!(no_headers.total_pages, 2);
    }

    #[test]
    fn bare_ids_and_unidentified_entries() {
        let page = parse_item_page(r#"[7, "8", {"title":"no id"}, null, 0]"#, PageHeaders::default(), 20)
            .unwrap();
        assert_eq!(page.items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![7, 8]);
        assert_eq!(page.items[0].title, "Item #7");
        assert_eq!(page.unidentified, 3);
    }

    #[test]
    fn page_errors_are_classified() {
        assert_matches!(
            parse_item_page("not json", PageHeaders::default(), 20),
            Err(TainacanError::Decode)
        );
        assert_matches!(
            parse_item_page(r#"{"code":"rest_forbidden","message":"Nope"}"#, PageHeaders::default(), 20),
            Err(TainacanError::Api { .. })
        );
        assert_matches!(
            parse_item_page(r#"{"unexpected":true}"#, PageHeaders::default(), 20),
            Err(TainacanError::InvalidResponse)
        );
    }

    #[test]
    fn item_info_owner_fallbacks() {
        let by_author = parse_item_info(1, r#"{"id":1,"title":"A","author_id":"12","url":"https://s.test/a"}"#)
            .unwrap();
        assert_eq!(by_author.owner_id, Some(12));
        assert_eq!(by_author.url.as_deref(), Some("https://s.test/a"));

        let by_meta = parse_item_info(2, r#"{"id":2,"author_id":0,"meta":{"_ur_user_id":["33"]}}"#).unwrap();
        assert_eq!(by_meta.owner_id, Some(33));
        assert_eq!(by_meta.title, "Item #2");

        let by_tcd = parse_item_info(3, r#"{"_tcd_user_id":9,"collection_id":4}"#).unwrap();
        assert_eq!(by_tcd.id, 3);
        assert_eq!(by_tcd.owner_id, Some(9));
        assert_eq!(by_tcd.collection_id, Some(4));

        let orphan = parse_item_info(4, r#"{"id":4}"#).unwrap();
        assert_eq!(orphan.owner_id, None);
    }

    #[test]
    fn owner_parsing() {
        let owner = parse_owner(r#"{"id":12,"name":"","username":"maria","email":"m@x.org"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(owner.name(), "maria");
        assert_eq!(owner.email, "m@x.org");

        assert!(parse_owner(r#"{"code":"rest_user_invalid_id","message":"Invalid user ID."}"#)
            .unwrap()
            .is_none());
        assert_matches!(
            parse_owner(r#"{"code":"rest_forbidden_context","message":"Sorry"}"#),
            Err(TainacanError::Api { .. })
        );
    }
}
