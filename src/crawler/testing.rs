//! In-memory capabilities for exercising tasks and the orchestrator

use crate::crawler::fetcher::Fetcher;
use crate::crawler::ledger::FrontierHandle;
use crate::crawler::parser::{ParsedPage, Parser};
use crate::storage::Persister;
use crate::{CrawlError, CrawlResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Body returned for pages registered with `unparseable`
const GARBAGE: &[u8] = &[0xff, 0xfe];

/// A scripted web: fetching a page returns its URL as the body and parsing
/// that body yields the page's registered links
#[derive(Default)]
pub(crate) struct FakeWeb {
    pages: HashMap<String, Vec<String>>,
    unparseable: HashSet<String>,
    failures: Mutex<HashMap<String, u32>>,
    panics: Mutex<HashSet<String>>,
    delay: Duration,
    fetches: Mutex<Vec<String>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeWeb {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a page and the links parsing it yields
    pub(crate) fn page(mut self, url: &str, links: &[&str]) -> Self {
        self.pages
            .insert(url.to_string(), links.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Every fetch of `url` fails
    pub(crate) fn always_failing(self, url: &str) -> Self {
        self.failing_times(url, u32::MAX)
    }

    /// The first `times` fetches of `url` fail
    pub(crate) fn failing_times(self, url: &str, times: u32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(url.to_string(), times);
        self
    }

    /// Fetching `url` succeeds but the body cannot be parsed
    pub(crate) fn unparseable(mut self, url: &str) -> Self {
        self.unparseable.insert(url.to_string());
        self
    }

    /// The first fetch of `url` panics
    pub(crate) fn panicking_once(self, url: &str) -> Self {
        self.panics.lock().unwrap().insert(url.to_string());
        self
    }

    /// Every fetch sleeps for `delay` before answering
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn fetch_count(&self, url: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|fetched| fetched.as_str() == url)
            .count()
    }

    pub(crate) fn total_fetches(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    /// Highest number of fetches observed running at once
    pub(crate) fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeWeb {
    async fn fetch(&self, url: &str) -> CrawlResult<Vec<u8>> {
        self.fetches.lock().unwrap().push(url.to_string());

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.panics.lock().unwrap().remove(url) {
            panic!("fetcher blew up on {}", url);
        }

        let failing = {
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(url) {
                Some(remaining) if *remaining > 0 => {
                    if *remaining != u32::MAX {
                        *remaining -= 1;
                    }
                    true
                }
                _ => false,
            }
        };
        if failing {
            return Err(CrawlError::Fetch {
                url: url.to_string(),
                message: "Connection refused".to_string(),
            });
        }

        if self.unparseable.contains(url) {
            return Ok(GARBAGE.to_vec());
        }

        if self.pages.contains_key(url) {
            Ok(url.as_bytes().to_vec())
        } else {
            Err(CrawlError::Fetch {
                url: url.to_string(),
                message: "HTTP 404".to_string(),
            })
        }
    }
}

impl Parser for FakeWeb {
    fn parse(&self, body: &[u8]) -> CrawlResult<ParsedPage> {
        if body == GARBAGE {
            return Err(CrawlError::Parse("garbage body".to_string()));
        }

        let url = String::from_utf8_lossy(body).to_string();
        Ok(ParsedPage {
            text: format!("text of {}", url),
            links: self.pages.get(&url).cloned().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SavedPage {
    pub(crate) url: String,
    pub(crate) text: String,
    pub(crate) metadata: String,
}

/// Persister keeping rows in memory
#[derive(Default)]
pub(crate) struct MemoryPersister {
    saved: Mutex<Vec<SavedPage>>,
    failing: HashSet<String>,
    observed: Option<FrontierHandle>,
    frontier_sizes: Mutex<Vec<usize>>,
}

impl MemoryPersister {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every save of `url` fails
    pub(crate) fn failing_for(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// Records the frontier length at the moment of each save
    pub(crate) fn observing(mut self, frontier: FrontierHandle) -> Self {
        self.observed = Some(frontier);
        self
    }

    pub(crate) fn saved(&self) -> Vec<SavedPage> {
        self.saved.lock().unwrap().clone()
    }

    pub(crate) fn saved_urls(&self) -> Vec<String> {
        self.saved().into_iter().map(|page| page.url).collect()
    }

    pub(crate) fn frontier_sizes_at_save(&self) -> Vec<usize> {
        self.frontier_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Persister for MemoryPersister {
    async fn save(&self, url: &str, text: &str, metadata: &str) -> CrawlResult<()> {
        if let Some(frontier) = &self.observed {
            self.frontier_sizes
                .lock()
                .unwrap()
                .push(frontier.frontier_len());
        }

        if self.failing.contains(url) {
            return Err(CrawlError::Persist {
                url: url.to_string(),
                message: "disk full".to_string(),
            });
        }

        self.saved.lock().unwrap().push(SavedPage {
            url: url.to_string(),
            text: text.to_string(),
            metadata: metadata.to_string(),
        });
        Ok(())
    }
}
