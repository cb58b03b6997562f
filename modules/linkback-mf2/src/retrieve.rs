use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;

use linkback_common::MfDocument;

use crate::handler::RemoteDocuments;

/// Hard cap on fetched response bodies.
const MAX_BODY_BYTES: usize = 1024 * 1024;
const FETCH_TIMEOUT: Duration = Duration::from_secs(100);
const USER_AGENT: &str = concat!(
    "linkback-mf2/",
    env!("CARGO_PKG_VERSION"),
    "; verifying linkback"
);

/// Parses fetched HTML into a microformats2 document. The interpreter never
/// parses HTML itself; implementations wrap whichever parser the host runs.
pub trait Mf2Parser: Send + Sync {
    fn parse(&self, html: &str, base_url: &str) -> anyhow::Result<MfDocument>;
}

/// HTTP-backed document retriever for author enrichment: a capped, timed-out
/// GET composed with the host's parser.
pub struct HttpRetriever<P> {
    client: reqwest::Client,
    parser: P,
}

impl<P: Mf2Parser> HttpRetriever<P> {
    pub fn new(parser: P) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(20))
            .user_agent(USER_AGENT)
            .build()
            .context("building HTTP client")?;
        Ok(HttpRetriever { client, parser })
    }
}

#[async_trait]
impl<P: Mf2Parser> RemoteDocuments for HttpRetriever<P> {
    async fn retrieve(&self, url: &str) -> anyhow::Result<MfDocument> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetching {url}"))?
            .error_for_status()?;

        if let Some(len) = response.content_length() {
            if len as usize > MAX_BODY_BYTES {
                return Err(anyhow!("response too large: {len} bytes"));
            }
        }
        let body = response.text().await?;
        if body.len() > MAX_BODY_BYTES {
            return Err(anyhow!("response too large: {} bytes", body.len()));
        }

        self.parser.parse(&body, url)
    }
}
