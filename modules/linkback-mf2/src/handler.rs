// The orchestrating handler: one parsed document plus a target URL in, one
// metadata map out. All fetching sits behind RemoteDocuments so the
// interpreter itself performs no I/O and tests run with mocks.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use linkback_common::{FlatValue, LinkbackMetadata, MfDocument, Result, Vocabulary};

use crate::assemble::{apply_author, assemble};
use crate::author::representative_author;
use crate::flatten::flatten;
use crate::item::representative_item;
use crate::urls::is_url;

/// Fetch-and-parse collaborator for the single-hop author enrichment.
/// Implementations own timeout policy; callers tolerate failure.
#[async_trait]
pub trait RemoteDocuments: Send + Sync {
    /// Fetch `url` and parse it into a microformats2 document.
    async fn retrieve(&self, url: &str) -> anyhow::Result<MfDocument>;
}

/// Interprets parsed linkback source documents into structured metadata.
pub struct Mf2Handler {
    vocab: Vocabulary,
    fetcher: Option<Arc<dyn RemoteDocuments>>,
}

impl Mf2Handler {
    pub fn new() -> Self {
        Mf2Handler {
            vocab: Vocabulary::default(),
            fetcher: None,
        }
    }

    pub fn with_vocab(mut self, vocab: Vocabulary) -> Self {
        self.vocab = vocab;
        self
    }

    /// Enable author enrichment through the given collaborator. Without
    /// one, bare author URLs are kept as unverified author URLs.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn RemoteDocuments>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Interpret one document. The representative item, once chosen, is
    /// final; a document with no recognizable item yields a bare mention.
    pub async fn interpret(
        &self,
        doc: &MfDocument,
        source: &str,
        target: &str,
    ) -> Result<LinkbackMetadata> {
        let Some(item) = representative_item(doc, target) else {
            debug!(source, target, "no representative item; defaulting to mention");
            return Ok(LinkbackMetadata::mention());
        };

        let properties = match flatten(item)? {
            FlatValue::Map(map) => map,
            _ => Default::default(),
        };

        let mut meta = assemble(&properties, &doc.rels, target, &self.vocab);

        let mut author = match properties.get("author") {
            Some(value) => Some(value.clone()),
            None => representative_author(doc)?,
        };

        // Two-phase enrichment: a bare author URL is the marker; one fetch,
        // never chained.
        if let Some(FlatValue::Text(url)) = &author {
            if is_url(url) {
                if let Some(enriched) = self.enrich_author(url).await {
                    author = Some(enriched);
                }
            }
        }

        if let Some(author) = &author {
            apply_author(&mut meta, author);
        }

        info!(source, target, entry_type = %meta.entry_type, "interpreted linkback document");
        Ok(meta)
    }

    async fn enrich_author(&self, url: &str) -> Option<FlatValue> {
        let fetcher = self.fetcher.as_ref()?;
        match fetcher.retrieve(url).await {
            Ok(doc) => match representative_author(&doc) {
                Ok(found) => found,
                Err(e) => {
                    warn!(url, error = %e, "author document was structurally invalid");
                    None
                }
            },
            Err(e) => {
                warn!(url, error = %e, "author enrichment fetch failed");
                None
            }
        }
    }
}

impl Default for Mf2Handler {
    fn default() -> Self {
        Self::new()
    }
}
