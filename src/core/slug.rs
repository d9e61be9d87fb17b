//! Slug derivation for titles and names.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Turns `"Café & Restaurants"` into `"cafe-restaurants"`.
///
/// Accents are stripped after NFKD decomposition; any run of characters that
/// are not ASCII letters or digits becomes a single `-`.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.nfkd().filter(|c| !is_combining_mark(*c)) {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out
}
