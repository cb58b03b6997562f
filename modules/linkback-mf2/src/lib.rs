//! Microformats2 linkback interpreter.
//!
//! Given a remote page's parsed microformats2 item tree and the URL of the
//! local resource it referenced, determine the representative item, the
//! representative author, the semantic interaction type (reply, like,
//! repost, bookmark, favorite, tag, quote, RSVP, or plain mention), and a
//! flattened property map suitable for storage. Parsing HTML, fetching, and
//! persisting are collaborators' jobs; the pipeline here is pure.

pub mod assemble;
pub mod author;
pub mod classify;
pub mod flatten;
pub mod handler;
pub mod item;
pub mod retrieve;
pub mod sanitize;
pub mod urls;

pub use assemble::{apply_author, assemble, convert_time};
pub use author::representative_author;
pub use classify::classify;
pub use flatten::{flatten, flatten_values};
pub use handler::{Mf2Handler, RemoteDocuments};
pub use item::representative_item;
pub use retrieve::{HttpRetriever, Mf2Parser};
pub use sanitize::sanitize_html;
pub use urls::{compare_urls, escape_url, is_url};

pub use linkback_common::{
    CommentFields, EntryType, FlatProperties, FlatValue, LinkbackError, LinkbackMetadata,
    MfDocument, MfItem, PropertyValue, Result, Vocabulary,
};
