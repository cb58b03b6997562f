use crate::types::EntryType;

/// The recognition vocabulary for a classification run: which property
/// classes and document relations map to which entry types, and which
/// flattened properties stay out of the residual storage bag.
///
/// Passed explicitly into classification and assembly so callers extend
/// recognition by composition, not global registration. Maps are ordered
/// pairs: declared order is match order.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub class_map: Vec<(String, EntryType)>,
    pub rel_map: Vec<(String, EntryType)>,
    pub property_blacklist: Vec<String>,
    /// When set, a simple (non-nested) property-class value must also match
    /// the target URL before it classifies. Off by default: presence of the
    /// class is treated as sufficient signal.
    pub require_target_match: bool,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let class_map = vec![
            ("in-reply-to".to_string(), EntryType::Reply),
            ("reply".to_string(), EntryType::Reply),
            ("reply-of".to_string(), EntryType::Reply),
            ("repost".to_string(), EntryType::Repost),
            ("repost-of".to_string(), EntryType::Repost),
            ("like".to_string(), EntryType::Like),
            ("like-of".to_string(), EntryType::Like),
            ("favorite".to_string(), EntryType::Favorite),
            ("favorite-of".to_string(), EntryType::Favorite),
            ("bookmark".to_string(), EntryType::Bookmark),
            ("bookmark-of".to_string(), EntryType::Bookmark),
            ("tag-of".to_string(), EntryType::Tag),
            ("quotation-of".to_string(), EntryType::Quote),
        ];

        let rel_map = vec![
            ("in-reply-to".to_string(), EntryType::Reply),
            ("reply-of".to_string(), EntryType::Reply),
        ];

        let property_blacklist = [
            "name",
            "content",
            "summary",
            "published",
            "updated",
            "type",
            "url",
            "comment",
            "bridgy-omit-link",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Vocabulary {
            class_map,
            rel_map,
            property_blacklist,
            require_target_match: false,
        }
    }
}

impl Vocabulary {
    pub fn blacklisted(&self, key: &str) -> bool {
        self.property_blacklist.iter().any(|k| k == key)
    }

    /// Recognize an additional property class.
    pub fn with_class(mut self, key: &str, entry_type: EntryType) -> Self {
        self.class_map.push((key.to_string(), entry_type));
        self
    }

    /// Recognize an additional document relation.
    pub fn with_rel(mut self, key: &str, entry_type: EntryType) -> Self {
        self.rel_map.push((key.to_string(), entry_type));
        self
    }

    /// Keep an additional property out of the residual storage bag.
    pub fn with_blacklisted(mut self, key: &str) -> Self {
        self.property_blacklist.push(key.to_string());
        self
    }

    pub fn strict_target(mut self, require: bool) -> Self {
        self.require_target_match = require;
        self
    }
}
