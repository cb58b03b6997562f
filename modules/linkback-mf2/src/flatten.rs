use std::collections::BTreeMap;

use linkback_common::{FlatValue, LinkbackError, MfItem, PropertyValue, Result};

use crate::urls::{escape_url, is_url};

/// Nesting bound for property recursion. Parsed microformats2 trees are
/// acyclic by construction; anything deeper than this is structurally
/// invalid input and fails loudly instead of recursing further.
const MAX_DEPTH: usize = 32;

/// The standard item types kept when an item declares several.
const STANDARD_TYPES: [&str; 7] = [
    "h-cite",
    "h-entry",
    "h-feed",
    "h-product",
    "h-event",
    "h-review",
    "h-recipe",
];

fn is_standard_type(t: &str) -> bool {
    STANDARD_TYPES.contains(&t)
}

/// Collapse an item's multi-valued property map into single values where
/// unambiguous, keeping nested structure only when genuinely multi-valued.
///
/// An item with no properties at all flattens to its raw value (a plain
/// author string, for example). URL-shaped scalars are escaped, and empty
/// entries are dropped, before the result is returned.
pub fn flatten(item: &MfItem) -> Result<FlatValue> {
    flatten_item(item, 0)
}

/// Flatten one property's value sequence: de-duplicate preserving order,
/// collapse singletons to scalars, recurse into nested items.
pub fn flatten_values(values: &[PropertyValue]) -> Result<Option<FlatValue>> {
    flatten_property(values, 0)
}

fn flatten_item(item: &MfItem, depth: usize) -> Result<FlatValue> {
    if depth > MAX_DEPTH {
        return Err(LinkbackError::InvalidDocument(format!(
            "property nesting exceeds depth bound of {MAX_DEPTH}"
        )));
    }

    if item.properties.is_empty() {
        return Ok(FlatValue::Text(item.value.clone().unwrap_or_default()));
    }

    let mut flat = BTreeMap::new();

    if let Some(t) = item.types.iter().find(|t| is_standard_type(t)) {
        flat.insert("type".to_string(), FlatValue::Text(t.clone()));
    }

    for (key, values) in &item.properties {
        if let Some(value) = flatten_property(values, depth + 1)? {
            flat.insert(key.clone(), value);
        }
    }

    // Escape URL-shaped scalars, then drop everything empty.
    for value in flat.values_mut() {
        if let FlatValue::Text(s) = value {
            if is_url(s) {
                *s = escape_url(s);
            }
        }
    }
    flat.retain(|_, v| !v.is_empty());

    Ok(FlatValue::Map(flat))
}

fn flatten_property(values: &[PropertyValue], depth: usize) -> Result<Option<FlatValue>> {
    if depth > MAX_DEPTH {
        return Err(LinkbackError::InvalidDocument(format!(
            "property nesting exceeds depth bound of {MAX_DEPTH}"
        )));
    }

    let mut unique: Vec<&PropertyValue> = Vec::new();
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }

    match unique.as_slice() {
        [] => Ok(None),
        [single] => flatten_one(single, depth).map(Some),
        many => {
            let list = many
                .iter()
                .map(|v| flatten_one(v, depth))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(FlatValue::List(list)))
        }
    }
}

fn flatten_one(value: &PropertyValue, depth: usize) -> Result<FlatValue> {
    match value {
        PropertyValue::Text(s) => Ok(FlatValue::Text(s.clone())),
        PropertyValue::Markup(markup) => {
            let mut map = BTreeMap::new();
            map.insert("html".to_string(), FlatValue::Text(markup.html.clone()));
            if let Some(text) = &markup.value {
                if !text.is_empty() {
                    map.insert("value".to_string(), FlatValue::Text(text.clone()));
                }
            }
            Ok(FlatValue::Map(map))
        }
        PropertyValue::Item(item) => flatten_item(item, depth + 1),
    }
}
