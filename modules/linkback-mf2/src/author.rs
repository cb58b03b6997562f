use linkback_common::{FlatValue, MfDocument, Result};

use crate::flatten::{flatten, flatten_values};

/// Locate the author identity for a document, in document order: a feed's
/// `author` property, else the first h-card, else the `rel=author` URLs.
///
/// This resolver never fetches. A single bare URL in the result is the
/// "needs enrichment" marker of the two-phase protocol: the orchestrator
/// may retrieve that URL's document once and re-run this resolver on it.
pub fn representative_author(doc: &MfDocument) -> Result<Option<FlatValue>> {
    for item in &doc.items {
        if item.has_type("h-feed") {
            if let Some(author) = item.properties.get("author") {
                return flatten_values(author);
            }
        }
        if item.has_type("h-card") {
            return flatten(item).map(Some);
        }
    }

    if let Some(urls) = doc.rels.get("author") {
        let urls: Vec<FlatValue> = urls
            .iter()
            .filter(|u| !u.is_empty())
            .map(|u| FlatValue::Text(u.clone()))
            .collect();
        return Ok(match urls.len() {
            0 => None,
            1 => urls.into_iter().next(),
            _ => Some(FlatValue::List(urls)),
        });
    }

    Ok(None)
}
