//! Canonicalization of user-entered item names.
//!
//! Reservations reference items by display name, typed by hand, so
//! "Cama Elástica 2,44" and "cama elastica 244" must compare equal.
//! Normalization lower-cases, folds the diacritics the legacy data uses,
//! and drops every run of non-alphanumeric characters, leaving a bare
//! `[a-z0-9]` comparison key.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Canonical comparison key for an item name. Deterministic, no side
/// effects; empty input yields the empty string.
pub fn normalize(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let folded: String = lowered.chars().map(fold_diacritic).collect();
    NON_ALNUM.replace_all(&folded, "").into_owned()
}

/// Splits the legacy comma-joined item column, dropping blank entries.
pub fn split_item_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        _ => c,
    }
}
