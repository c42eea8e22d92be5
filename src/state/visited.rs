//! Visited set
//!
//! Records URLs whose crawl pipeline completed successfully. There is no
//! removal: once visited, a URL stays visited for the lifetime of the crawl.

use std::collections::HashSet;

/// Set of successfully crawled URLs, compared by exact string equality
#[derive(Debug, Default, Clone)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `url` has been marked
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Marks `url` as visited
    ///
    /// Returns true if the URL was not already present.
    pub fn mark(&mut self, url: &str) -> bool {
        if self.urls.contains(url) {
            return false;
        }
        self.urls.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Iterates over visited URLs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.urls.iter().map(String::as_str)
    }
}
