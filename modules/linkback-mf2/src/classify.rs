use std::collections::BTreeMap;

use linkback_common::{EntryType, FlatProperties, FlatValue, Vocabulary};

use crate::urls::compare_urls;

/// Item types whose nested citations can carry a classifying URL.
const CITATION_TYPES: [&str; 2] = ["h-cite", "h-entry"];

/// Decide the semantic interaction type the flattened item expresses toward
/// `target`. Degrades gracefully: a document with no recognizable semantics
/// is a `mention`, never an error.
///
/// Precedence, first decisive rule wins: an `rsvp` property verbatim; the
/// vocabulary's property classes in declared order; the vocabulary's
/// document relations in declared order; `mention`.
pub fn classify(
    target: &str,
    properties: &FlatProperties,
    rels: &BTreeMap<String, Vec<String>>,
    vocab: &Vocabulary,
) -> EntryType {
    if let Some(rsvp) = properties.get("rsvp") {
        if let Some(value) = rsvp.first_text() {
            return EntryType::Rsvp(value.to_string());
        }
    }

    for (key, entry_type) in &vocab.class_map {
        let Some(value) = properties.get(key) else {
            continue;
        };

        // Simple values classify by presence alone unless the vocabulary
        // demands target correlation.
        let texts = value.texts();
        if !texts.is_empty() {
            if !vocab.require_target_match || compare_urls(target, &texts, true) {
                return entry_type.clone();
            }
        }

        // Nested citations only count when typed as a citation and pointing
        // at the target.
        if citation_matches_target(value, target) {
            return entry_type.clone();
        }
    }

    if rels.is_empty() {
        return EntryType::Mention;
    }

    for (key, entry_type) in &vocab.rel_map {
        if let Some(urls) = rels.get(key) {
            if urls.iter().any(|u| u == target) {
                return entry_type.clone();
            }
        }
    }

    EntryType::Mention
}

fn citation_matches_target(value: &FlatValue, target: &str) -> bool {
    match value {
        FlatValue::Map(cite) => {
            let typed = cite
                .get("type")
                .and_then(FlatValue::as_text)
                .is_some_and(|t| CITATION_TYPES.contains(&t));
            if !typed {
                return false;
            }
            cite.get("url")
                .map(|url| compare_urls(target, &url.texts(), true))
                .unwrap_or(false)
        }
        FlatValue::List(values) => values.iter().any(|v| citation_matches_target(v, target)),
        FlatValue::Text(_) => false,
    }
}
