//! Language detection from the document's site locale

use crate::types::Document;

/// Language used when the document carries no locale
pub const DEFAULT_LANGUAGE: &str = "en";

/// Short language code for a document, e.g. "en-US" -> "en".
///
/// No validation happens here; unknown codes are resolved by the
/// stop-word lookup.
pub fn detect_language(document: &Document) -> String {
    primary_subtag(document.locale.as_deref().unwrap_or(DEFAULT_LANGUAGE))
}

/// Primary subtag of a locale string, lower-cased
pub fn primary_subtag(locale: &str) -> String {
    let locale = locale.trim();
    if locale.is_empty() {
        return DEFAULT_LANGUAGE.to_string();
    }
    locale
        .split('-')
        .next()
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_lowercase()
}
