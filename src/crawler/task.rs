//! Crawl task - the fetch, parse, persist pipeline for one URL
//!
//! A task never retries. It reports a `WorkRecord` and the orchestrator
//! decides what happens to the URL next.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::ledger::{FrontierHandle, WorkRecord};
use crate::crawler::parser::Parser;
use crate::storage::Persister;
use crate::{CrawlError, CrawlResult};
use std::sync::Arc;
use url::Url;

/// One URL's pipeline plus the capabilities it runs against
#[derive(Clone)]
pub struct CrawlTask {
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn Parser>,
    persister: Arc<dyn Persister>,
    frontier: FrontierHandle,
}

impl CrawlTask {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        parser: Arc<dyn Parser>,
        persister: Arc<dyn Persister>,
        frontier: FrontierHandle,
    ) -> Self {
        Self {
            fetcher,
            parser,
            persister,
            frontier,
        }
    }

    /// Runs the pipeline for `url` and reports the outcome
    pub async fn run(&self, url: String) -> WorkRecord {
        let outcome = self.process(&url).await;
        WorkRecord { url, outcome }
    }

    /// Runs each stage in order, stopping at the first failure
    ///
    /// 1. Fetch the body
    /// 2. Parse text and links
    /// 3. Push links to the frontier (kept even if a later stage fails)
    /// 4. Derive the host
    /// 5. Persist
    async fn process(&self, url: &str) -> CrawlResult<()> {
        tracing::debug!("Started processing {}", url);

        let body = self.fetcher.fetch(url).await?;
        tracing::debug!("{} was fetched successfully ({} bytes)", url, body.len());

        let page = self.parser.parse(&body)?;
        tracing::debug!("{} was parsed successfully", url);

        let discovered = self.frontier.push(page.links);
        tracing::debug!("{} new urls were added to the frontier from {}", discovered, url);

        let host = host_of(url)?;
        self.persister.save(url, &page.text, &host).await?;

        Ok(())
    }
}

/// Returns the authority of `url` (`host` or `host:port`)
///
/// Default ports are not included.
pub fn host_of(url: &str) -> CrawlResult<String> {
    let parsed = Url::parse(url).map_err(|e| CrawlError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let host = parsed.host_str().unwrap_or_default();
    Ok(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
