//! Lenient readers for admin form fields.
//!
//! Admin forms post every field as text. Ids follow WordPress `absint`
//! (absolute value, anything unparsable is `0`) and flags accept the usual
//! truthy spellings.

use doccheck_core::types::DbId;

/// Parse an id field; absent or malformed values yield `0`.
pub fn absint(value: Option<&str>) -> DbId {
    value
        .map(str::trim)
        .and_then(|v| v.parse::<i64>().ok())
        .map(i64::saturating_abs)
        .unwrap_or(0)
}

/// Parse an optional numeric field, treating empty text as absent.
pub fn optional_int(value: Option<&str>) -> Option<i64> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

/// Whether a checkbox-style field is set.
pub fn flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_lowercase()).as_deref(),
        Some("1" | "true" | "on" | "yes")
    )
}

/// Parse a comma separated id list, dropping zeros and duplicates.
pub fn id_list(value: Option<&str>) -> Vec<DbId> {
    let mut ids = Vec::new();
    for id in value.unwrap_or("").split(',').map(|v| absint(Some(v))) {
        if id > 0 && !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absint_is_forgiving() {
        assert_eq!(absint(Some("42")), 42);
        assert_eq!(absint(Some(" -7 ")), 7);
        assert_eq!(absint(Some("abc")), 0);
        assert_eq!(absint(None), 0);
    }

    #[test]
    fn flags_accept_truthy_spellings() {
        assert!(flag(Some("1")));
        assert!(flag(Some("TRUE")));
        assert!(!flag(Some("0")));
        assert!(!flag(Some("")));
        assert!(!flag(None));
    }

    #[test]
    fn id_lists_are_cleaned() {
        assert_eq!(id_list(Some("3, 5,,0,3,x,9")), vec![3, 5, 9]);
        assert!(id_list(None).is_empty());
    }

    #[test]
    fn empty_optional_ints_are_absent() {
        assert_eq!(optional_int(Some("")), None);
        assert_eq!(optional_int(Some("20")), Some(20));
    }
}
