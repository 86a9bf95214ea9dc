//! Entity-name normalization for lookups and map matching.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Words that only mark the administrative level of a name.
const LEVEL_WORDS: [&str; 2] = ["regija", "obcina"];

/// Lowercase and collapse runs of whitespace. Used for name lookups in the aggregator.
pub fn fold_whitespace_case(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Map-matching key: lowercase, diacritics stripped, "regija"/"občina" dropped, trimmed.
///
/// Makes "Pomurska regija" match "Pomurska" and "Občina Ajdovščina" match
/// "ajdovscina", whatever layer or language form a name comes from.
pub fn normalize_feature_name(name: &str) -> String {
    let stripped: String = name
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    stripped
        .split_whitespace()
        .filter(|word| !LEVEL_WORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}
