use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use percent_encoding::percent_decode_str;

use linkback_common::{FlatProperties, FlatValue, LinkbackMetadata, Vocabulary};

use crate::classify::classify;
use crate::sanitize::sanitize_html;
use crate::urls::{escape_url, is_url};

/// Parse a source document's textual timestamp into UTC. Returns `None` on
/// anything unparseable; a missing timestamp stays missing, never "now".
pub fn convert_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Combine flattened properties and document relations into the final
/// metadata map: type, timestamps, canonical URL, content, geo,
/// syndication, and the namespaced residual property bag.
pub fn assemble(
    properties: &FlatProperties,
    rels: &BTreeMap<String, Vec<String>>,
    target: &str,
    vocab: &Vocabulary,
) -> LinkbackMetadata {
    let mut meta = LinkbackMetadata::mention();
    meta.entry_type = classify(target, properties, rels, vocab);

    meta.published_at = properties
        .get("published")
        .and_then(FlatValue::first_text)
        .and_then(convert_time)
        .or_else(|| {
            properties
                .get("updated")
                .and_then(FlatValue::first_text)
                .and_then(convert_time)
        });

    meta.canonical_url = properties
        .get("url")
        .and_then(FlatValue::first_text)
        .filter(|s| !s.is_empty())
        .map(escape_url);

    let content = if let Some(summary) = properties.get("summary").and_then(FlatValue::first_text) {
        summary.to_string()
    } else if let Some(html) = properties
        .get("content")
        .and_then(FlatValue::as_map)
        .and_then(|m| m.get("html"))
        .and_then(FlatValue::as_text)
    {
        sanitize_html(html)
    } else if let Some(text) = properties.get("content").and_then(FlatValue::first_text) {
        sanitize_html(text)
    } else if let Some(name) = properties.get("name").and_then(FlatValue::first_text) {
        name.to_string()
    } else {
        String::new()
    };
    let content = content.trim();
    if !content.is_empty() {
        meta.content = Some(content.to_string());
    }

    match properties.get("syndication") {
        Some(value) => meta.syndication = value.texts(),
        None => {
            if let Some(urls) = rels.get("syndication") {
                meta.syndication = urls.clone();
            }
        }
    }

    if let Some(location) = properties.get("location") {
        apply_location(&mut meta, location);
    }

    for (key, value) in properties {
        if vocab.blacklisted(key) || value.is_empty() {
            continue;
        }
        meta.extra.insert(format!("mf2_{key}"), value.clone());
    }
    // The relation-derived syndication joins the residual bag like the
    // property it stands in for.
    if !properties.contains_key("syndication") && !meta.syndication.is_empty() {
        let value = if meta.syndication.len() == 1 {
            FlatValue::Text(meta.syndication[0].clone())
        } else {
            FlatValue::List(meta.syndication.iter().cloned().map(FlatValue::Text).collect())
        };
        meta.extra.insert("mf2_syndication".to_string(), value);
    }

    meta
}

fn apply_location(meta: &mut LinkbackMetadata, location: &FlatValue) {
    match location {
        FlatValue::Map(map) => {
            meta.geo_latitude = map
                .get("latitude")
                .and_then(FlatValue::first_text)
                .map(str::to_string);
            meta.geo_longitude = map
                .get("longitude")
                .and_then(FlatValue::first_text)
                .map(str::to_string);
            meta.geo_address = map
                .get("name")
                .and_then(FlatValue::first_text)
                .map(str::to_string);
        }
        FlatValue::Text(s) => {
            if let Some(rest) = s.strip_prefix("geo:") {
                let decoded = percent_decode_str(rest).decode_utf8_lossy();
                // geo URIs: coordinates before any further `:` part, with
                // `;`-delimited parameters stripped.
                let coords = decoded
                    .split(':')
                    .next()
                    .unwrap_or("")
                    .split(';')
                    .next()
                    .unwrap_or("");
                let mut parts = coords.split(',');
                if let Some(lat) = parts.next().map(str::trim).filter(|s| !s.is_empty()) {
                    meta.geo_latitude = Some(lat.to_string());
                }
                if let Some(lon) = parts.next().map(str::trim).filter(|s| !s.is_empty()) {
                    meta.geo_longitude = Some(lon.to_string());
                }
            } else {
                meta.geo_address = Some(s.clone());
            }
        }
        FlatValue::List(_) => {}
    }
}

/// Map a resolved author value onto the output's author fields.
///
/// A card maps `name`/`email`/`url`/`photo`; a multi-valued card URL
/// prefers the value matching the card's own `uid`, else the first. A bare
/// URL is kept as an unverified author URL; any other bare string is a
/// display name.
pub fn apply_author(meta: &mut LinkbackMetadata, author: &FlatValue) {
    match author {
        FlatValue::Text(s) => {
            if is_url(s) {
                meta.author_url = Some(escape_url(s));
            } else if !s.is_empty() {
                meta.author_name = Some(s.clone());
            }
        }
        FlatValue::List(_) => {
            if let Some(url) = author.first_text() {
                if is_url(url) {
                    meta.author_url = Some(escape_url(url));
                }
            }
        }
        FlatValue::Map(card) => {
            meta.author_name = card
                .get("name")
                .and_then(FlatValue::first_text)
                .map(str::to_string);
            meta.author_email = card
                .get("email")
                .and_then(FlatValue::first_text)
                .map(str::to_string);
            if let Some(url) = card.get("url") {
                let urls = url.texts();
                let uid = card.get("uid").and_then(FlatValue::first_text);
                let chosen = match uid {
                    Some(uid) if urls.iter().any(|u| u.as_str() == uid) => Some(uid.to_string()),
                    _ => urls.into_iter().next(),
                };
                meta.author_url = chosen.map(|u| escape_url(&u));
            }
            meta.avatar_url = card
                .get("photo")
                .and_then(FlatValue::first_text)
                .map(|photo| {
                    if is_url(photo) {
                        escape_url(photo)
                    } else {
                        photo.to_string()
                    }
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TARGET: &str = "https://target.example/post";

    fn props(value: serde_json::Value) -> FlatProperties {
        serde_json::from_value(value).unwrap()
    }

    fn no_rels() -> BTreeMap<String, Vec<String>> {
        BTreeMap::new()
    }

    fn assemble_default(properties: &FlatProperties) -> LinkbackMetadata {
        assemble(properties, &no_rels(), TARGET, &Vocabulary::default())
    }

    #[test]
    fn published_is_preferred_over_updated() {
        let properties = props(serde_json::json!({
            "published": "2024-03-01T12:00:00Z",
            "updated": "2024-04-01T12:00:00Z"
        }));
        let meta = assemble_default(&properties);
        assert_eq!(
            meta.published_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn timestamps_normalize_offsets_to_utc() {
        let properties = props(serde_json::json!({"published": "2024-03-01T12:00:00+02:00"}));
        let meta = assemble_default(&properties);
        assert_eq!(
            meta.published_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn junk_timestamps_yield_no_date() {
        assert_eq!(convert_time("yesterday-ish"), None);
        let properties = props(serde_json::json!({"published": "not a date"}));
        assert!(assemble_default(&properties).published_at.is_none());
    }

    #[test]
    fn canonical_url_takes_first_of_multi_valued() {
        let properties = props(serde_json::json!({
            "url": ["https://example.com/a", "https://example.com/b"]
        }));
        let meta = assemble_default(&properties);
        assert_eq!(meta.canonical_url.as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn summary_wins_over_content_and_name() {
        let properties = props(serde_json::json!({
            "summary": "the summary",
            "content": {"html": "<p>the content</p>"},
            "name": "the name"
        }));
        assert_eq!(assemble_default(&properties).content.as_deref(), Some("the summary"));
    }

    #[test]
    fn content_html_is_sanitized() {
        let properties = props(serde_json::json!({
            "content": {"html": "<p>hi</p><script>alert(1)</script>"}
        }));
        assert_eq!(assemble_default(&properties).content.as_deref(), Some("<p>hi</p>"));
    }

    #[test]
    fn name_is_the_last_resort() {
        let properties = props(serde_json::json!({"name": "  a note  "}));
        assert_eq!(assemble_default(&properties).content.as_deref(), Some("a note"));
    }

    #[test]
    fn geo_uri_splits_into_coordinates() {
        let properties = props(serde_json::json!({"location": "geo:40.7,-74.0"}));
        let meta = assemble_default(&properties);
        assert_eq!(meta.geo_latitude.as_deref(), Some("40.7"));
        assert_eq!(meta.geo_longitude.as_deref(), Some("-74.0"));
        assert!(meta.geo_address.is_none());
    }

    #[test]
    fn geo_uri_parameters_are_stripped() {
        let properties = props(serde_json::json!({"location": "geo:40.7,-74.0;u=35"}));
        let meta = assemble_default(&properties);
        assert_eq!(meta.geo_latitude.as_deref(), Some("40.7"));
        assert_eq!(meta.geo_longitude.as_deref(), Some("-74.0"));
    }

    #[test]
    fn nested_location_maps_latitude_longitude_name() {
        let properties = props(serde_json::json!({
            "location": {"latitude": "44.97", "longitude": "-93.26", "name": "Minneapolis"}
        }));
        let meta = assemble_default(&properties);
        assert_eq!(meta.geo_latitude.as_deref(), Some("44.97"));
        assert_eq!(meta.geo_longitude.as_deref(), Some("-93.26"));
        assert_eq!(meta.geo_address.as_deref(), Some("Minneapolis"));
    }

    #[test]
    fn free_text_location_is_an_address() {
        let properties = props(serde_json::json!({"location": "Powderhorn Park"}));
        let meta = assemble_default(&properties);
        assert_eq!(meta.geo_address.as_deref(), Some("Powderhorn Park"));
        assert!(meta.geo_latitude.is_none());
    }

    #[test]
    fn syndication_falls_back_to_rels() {
        let properties = props(serde_json::json!({"name": "x"}));
        let mut rels = no_rels();
        rels.insert(
            "syndication".to_string(),
            vec!["https://social.example/status/1".to_string()],
        );
        let meta = assemble(&properties, &rels, TARGET, &Vocabulary::default());
        assert_eq!(meta.syndication, vec!["https://social.example/status/1"]);
        assert_eq!(
            meta.extra.get("mf2_syndication"),
            Some(&FlatValue::Text("https://social.example/status/1".to_string()))
        );
    }

    #[test]
    fn syndication_property_wins_over_rels() {
        let properties = props(serde_json::json!({"syndication": "https://a.example/1"}));
        let mut rels = no_rels();
        rels.insert("syndication".to_string(), vec!["https://b.example/2".to_string()]);
        let meta = assemble(&properties, &rels, TARGET, &Vocabulary::default());
        assert_eq!(meta.syndication, vec!["https://a.example/1"]);
    }

    #[test]
    fn residual_properties_are_namespaced() {
        let properties = props(serde_json::json!({
            "custom-thing": "x",
            "name": "blacklisted",
            "url": "https://example.com/"
        }));
        let meta = assemble_default(&properties);
        assert_eq!(
            meta.extra.get("mf2_custom-thing"),
            Some(&FlatValue::Text("x".to_string()))
        );
        assert!(!meta.extra.contains_key("mf2_name"));
        assert!(!meta.extra.contains_key("mf2_url"));
    }

    #[test]
    fn author_card_maps_all_fields() {
        let mut meta = LinkbackMetadata::mention();
        let card = props(serde_json::json!({
            "name": "Jane",
            "email": "mailto:jane@example.com",
            "url": "https://jane.example/",
            "photo": "https://jane.example/me.jpg"
        }));
        apply_author(&mut meta, &FlatValue::Map(card));
        assert_eq!(meta.author_name.as_deref(), Some("Jane"));
        assert_eq!(meta.author_email.as_deref(), Some("mailto:jane@example.com"));
        assert_eq!(meta.author_url.as_deref(), Some("https://jane.example/"));
        assert_eq!(meta.avatar_url.as_deref(), Some("https://jane.example/me.jpg"));
    }

    #[test]
    fn multi_valued_author_url_prefers_uid() {
        let mut meta = LinkbackMetadata::mention();
        let card = props(serde_json::json!({
            "name": "Jane",
            "uid": "https://jane.example/canonical",
            "url": ["https://jane.example/other", "https://jane.example/canonical"]
        }));
        apply_author(&mut meta, &FlatValue::Map(card));
        assert_eq!(meta.author_url.as_deref(), Some("https://jane.example/canonical"));
    }

    #[test]
    fn multi_valued_author_url_without_uid_takes_first() {
        let mut meta = LinkbackMetadata::mention();
        let card = props(serde_json::json!({
            "url": ["https://jane.example/a", "https://jane.example/b"]
        }));
        apply_author(&mut meta, &FlatValue::Map(card));
        assert_eq!(meta.author_url.as_deref(), Some("https://jane.example/a"));
    }

    #[test]
    fn bare_author_string_is_a_display_name() {
        let mut meta = LinkbackMetadata::mention();
        apply_author(&mut meta, &FlatValue::Text("Jane Doe".to_string()));
        assert_eq!(meta.author_name.as_deref(), Some("Jane Doe"));
        assert!(meta.author_url.is_none());
    }

    #[test]
    fn bare_author_url_is_kept_unverified() {
        let mut meta = LinkbackMetadata::mention();
        apply_author(&mut meta, &FlatValue::Text("https://jane.example/".to_string()));
        assert_eq!(meta.author_url.as_deref(), Some("https://jane.example/"));
        assert!(meta.author_name.is_none());
    }
}
