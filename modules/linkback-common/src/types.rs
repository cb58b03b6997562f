use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// --- Parsed document model ---
//
// The shape mirrors canonical microformats2 JSON, so any parser that emits
// the canonical form feeds this model through serde directly.

/// A single microformats2 item: typed, with multi-valued properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MfItem {
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Vec<PropertyValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl MfItem {
    pub fn has_type(&self, t: &str) -> bool {
        self.types.iter().any(|s| s == t)
    }

    /// Plain-text values of the `url` property.
    pub fn url_values(&self) -> Vec<String> {
        self.properties
            .get("url")
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_text().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// One value of a microformats2 property: plain text, embedded markup
/// (`e-*` properties carry an `html` payload), or a nested item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Markup(EmbeddedMarkup),
    Item(MfItem),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// The `{html, value}` payload of an `e-*` property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedMarkup {
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A parsed microformats2 document: top-level items plus document-level
/// relations (`rel` attribute values, keyed by relation name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MfDocument {
    #[serde(default)]
    pub items: Vec<MfItem>,
    #[serde(default)]
    pub rels: BTreeMap<String, Vec<String>>,
}

// --- Flattened properties ---

/// A flattened property value: scalars where unambiguous, lists only when
/// genuinely multi-valued, maps for nested items. Produced by the flattener;
/// never contains empty strings, empty lists, or all-empty maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlatValue {
    Text(String),
    List(Vec<FlatValue>),
    Map(BTreeMap<String, FlatValue>),
}

/// A flattened item: property name to flattened value.
pub type FlatProperties = BTreeMap<String, FlatValue>;

impl FlatValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FlatValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&FlatProperties> {
        match self {
            FlatValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// All plain-text leaves, in order. Maps contribute nothing.
    pub fn texts(&self) -> Vec<String> {
        match self {
            FlatValue::Text(s) => vec![s.clone()],
            FlatValue::List(values) => values.iter().flat_map(|v| v.texts()).collect(),
            FlatValue::Map(_) => Vec::new(),
        }
    }

    /// First plain-text leaf, if any.
    pub fn first_text(&self) -> Option<&str> {
        match self {
            FlatValue::Text(s) => Some(s),
            FlatValue::List(values) => values.iter().find_map(|v| v.first_text()),
            FlatValue::Map(_) => None,
        }
    }

    /// True when the value carries no content at all.
    pub fn is_empty(&self) -> bool {
        match self {
            FlatValue::Text(s) => s.is_empty(),
            FlatValue::List(values) => values.iter().all(|v| v.is_empty()),
            FlatValue::Map(map) => map.values().all(|v| v.is_empty()),
        }
    }
}

// --- Entry types ---

/// The semantic relationship a linkback expresses toward the target.
/// `Mention` is the fallback and is never explicitly tagged in a document.
/// RSVP carries its response value verbatim (`yes`, `no`, `maybe`,
/// `interested`, `invited` by convention, but free-form at this layer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryType {
    Mention,
    Reply,
    Repost,
    Like,
    Favorite,
    Bookmark,
    Tag,
    Quote,
    Invited,
    Rsvp(String),
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::Mention => write!(f, "mention"),
            EntryType::Reply => write!(f, "reply"),
            EntryType::Repost => write!(f, "repost"),
            EntryType::Like => write!(f, "like"),
            EntryType::Favorite => write!(f, "favorite"),
            EntryType::Bookmark => write!(f, "bookmark"),
            EntryType::Tag => write!(f, "tag"),
            EntryType::Quote => write!(f, "quote"),
            EntryType::Invited => write!(f, "invited"),
            EntryType::Rsvp(value) => write!(f, "rsvp:{value}"),
        }
    }
}

impl EntryType {
    pub fn from_str_loose(s: &str) -> Self {
        if let Some(value) = s.strip_prefix("rsvp:") {
            return EntryType::Rsvp(value.to_string());
        }
        match s {
            "reply" => EntryType::Reply,
            "repost" => EntryType::Repost,
            "like" => EntryType::Like,
            "favorite" => EntryType::Favorite,
            "bookmark" => EntryType::Bookmark,
            "tag" => EntryType::Tag,
            "quote" => EntryType::Quote,
            "invited" => EntryType::Invited,
            _ => EntryType::Mention,
        }
    }
}

impl Serialize for EntryType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EntryType::from_str_loose(&s))
    }
}

// --- Interpreter output ---

/// Structured metadata extracted from a linkback source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkbackMetadata {
    pub entry_type: EntryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Sanitized, trimmed content. Absent content is absent, never an error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_latitude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_longitude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_address: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub syndication: Vec<String>,
    /// Residual flattened properties, keyed `mf2_<property>`. Forward-compatible
    /// storage for vocabulary the interpreter does not model explicitly.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, FlatValue>,
}

impl LinkbackMetadata {
    /// The bare result for a document with no recognizable item: a mention
    /// and nothing else.
    pub fn mention() -> Self {
        LinkbackMetadata {
            entry_type: EntryType::Mention,
            canonical_url: None,
            author_name: None,
            author_email: None,
            author_url: None,
            avatar_url: None,
            published_at: None,
            content: None,
            geo_latitude: None,
            geo_longitude: None,
            geo_address: None,
            syndication: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Canonical URL with fallback to the linkback source.
    pub fn url_or<'a>(&'a self, source: &'a str) -> &'a str {
        self.canonical_url.as_deref().unwrap_or(source)
    }

    /// Render the named metadata entries a storage collaborator persists,
    /// one `(key, value)` pair per entry. Empty values are filtered out.
    pub fn meta_entries(&self) -> Vec<(String, String)> {
        let mut entries = vec![(
            "semantic_linkbacks_type".to_string(),
            self.entry_type.to_string(),
        )];

        let scalar = [
            ("semantic_linkbacks_canonical", &self.canonical_url),
            ("semantic_linkbacks_author_url", &self.author_url),
            ("semantic_linkbacks_avatar", &self.avatar_url),
            ("geo_latitude", &self.geo_latitude),
            ("geo_longitude", &self.geo_longitude),
            ("geo_address", &self.geo_address),
        ];
        for (key, value) in scalar {
            if let Some(v) = value {
                if !v.is_empty() {
                    entries.push((key.to_string(), v.clone()));
                }
            }
        }

        for (key, value) in &self.extra {
            if value.is_empty() {
                continue;
            }
            let rendered = match value {
                FlatValue::Text(s) => s.clone(),
                other => serde_json::to_string(other).unwrap_or_default(),
            };
            if !rendered.is_empty() {
                entries.push((key.clone(), rendered));
            }
        }

        entries
    }

    /// Bridge into the comment-shaped record the storage collaborator fills.
    pub fn comment_fields(&self, source: &str) -> CommentFields {
        let mut comment_meta = self.meta_entries();
        if !source.is_empty() {
            comment_meta.push(("semantic_linkbacks_source".to_string(), source.to_string()));
        }
        CommentFields {
            comment_content: self.content.clone().unwrap_or_default(),
            comment_author: self.author_name.clone(),
            comment_author_email: self.author_email.clone(),
            comment_author_url: Some(source.to_string()).filter(|s| !s.is_empty()),
            comment_date: self.published_at,
            comment_meta,
        }
    }
}

/// The comment-shaped surface handed to the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentFields {
    pub comment_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_author_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_author_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_date: Option<DateTime<Utc>>,
    pub comment_meta: Vec<(String, String)>,
}
