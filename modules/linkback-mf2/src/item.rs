use linkback_common::{MfDocument, MfItem};

use crate::urls::compare_urls;

/// Select the top-level item that represents the linkback toward `target`.
///
/// First match wins, in order: a document with a single item returns it
/// unconditionally; otherwise the first non-feed item whose `url` property
/// matches the target (scheme-insensitively); otherwise, when the document
/// declares `rel=author` and an h-card corroborates it, the first non-card
/// item. `None` means "undetermined", not an error.
pub fn representative_item<'a>(doc: &'a MfDocument, target: &str) -> Option<&'a MfItem> {
    if doc.items.is_empty() {
        return None;
    }
    if doc.items.len() == 1 {
        return Some(&doc.items[0]);
    }

    for item in &doc.items {
        let urls = item.url_values();
        if !urls.is_empty() && compare_urls(target, &urls, true) && !item.has_type("h-feed") {
            return Some(item);
        }
    }

    // An author h-card corroborated by rel=author marks the page as a
    // single-author page; its first non-card item stands for the linkback.
    if let Some(rel_authors) = doc.rels.get("author") {
        for card in &doc.items {
            if !card.has_type("h-card") {
                continue;
            }
            let urls = card.url_values();
            if urls.iter().any(|u| rel_authors.contains(u)) {
                return doc.items.iter().find(|item| !item.has_type("h-card"));
            }
        }
    }

    None
}
