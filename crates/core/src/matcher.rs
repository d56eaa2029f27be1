//! Fuzzy matching of attachment names against required-document tokens.
//!
//! Matching is a fixed sequence of boolean containment heuristics over the
//! case-folded name, with and without its extension. There is no scoring:
//! the first rule that succeeds decides.

/// Shortest abbreviation accepted by the word-prefix rule (`doc` for `documento`).
const MIN_ABBREVIATION_LEN: usize = 3;

/// Decide whether `candidate` (a filename, title or slug) satisfies the
/// required-document `token`.
///
/// An empty token matches everything; callers must never configure one
/// (see [`crate::settings::normalize_required_documents`]).
///
/// ```
/// use doccheck_core::matcher::document_matches;
///
/// assert!(document_matches("Comprovante_Endereco_2024.PDF", "comprovante_endereco"));
/// assert!(document_matches("documento-identidade.jpg", "documento_identidade"));
/// assert!(!document_matches("recibo.pdf", "comprovante_endereco"));
/// ```
pub fn document_matches(candidate: &str, token: &str) -> bool {
    let raw = candidate.trim().to_lowercase();
    let stem = strip_extension(&raw);
    let token = token.trim().to_lowercase();

    if raw == token || stem == token {
        return true;
    }

    let contains = |needle: &str| raw.contains(needle) || stem.contains(needle);

    if contains(&token) {
        return true;
    }

    let with_hyphens = token.replace('_', "-");
    let with_underscores = token.replace('-', "_");
    if contains(&with_hyphens) || contains(&with_underscores) {
        return true;
    }

    let with_spaces = token.replace(['_', '-'], " ");
    if contains(&with_spaces) {
        return true;
    }

    let stem_alnum = alphanumeric_only(stem);
    let token_alnum = alphanumeric_only(&token);
    if !token_alnum.is_empty() && stem_alnum.contains(&token_alnum) {
        return true;
    }

    abbreviated_words_match(stem, &token)
}

/// Strip the last extension from a lower-cased file name.
///
/// Names whose only dot is the leading one (`.env`) are returned unchanged.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

fn alphanumeric_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

fn words(s: &str) -> Vec<&str> {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Word-aligned abbreviation rule.
///
/// The stem must contain a contiguous run of words aligned one-to-one with
/// the token's words, each stem word being a prefix of at least
/// [`MIN_ABBREVIATION_LEN`] characters of its token word, and at least one
/// pair matching in full.
fn abbreviated_words_match(stem: &str, token: &str) -> bool {
    let token_words = words(token);
    let stem_words = words(stem);

    if token_words.len() < 2 || stem_words.len() < token_words.len() {
        return false;
    }

    stem_words.windows(token_words.len()).any(|window| {
        let aligned = window.iter().zip(&token_words).all(|(short, full)| {
            full.starts_with(short) && short.len() >= MIN_ABBREVIATION_LEN.min(full.len())
        });
        let has_full_word = window.iter().zip(&token_words).any(|(s, f)| s == f);
        aligned && has_full_word
    })
}
