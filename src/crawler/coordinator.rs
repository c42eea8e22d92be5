//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the dispatch loop that coordinates the crawl:
//! - Claiming eligible URLs from the ledger
//! - Running at most `workers` crawl tasks at once
//! - Resolving each task's outcome (visited, requeued, abandoned)
//! - Stopping on frontier exhaustion, the page cap or the stop token
//! - Draining in-flight tasks before reporting

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::ledger::{AbandonReason, Dispatch, FrontierHandle, Resolution, RetryPolicy, WorkRecord};
use crate::crawler::parser::{HtmlParser, Parser};
use crate::crawler::report::{CrawlReport, StopReason};
use crate::crawler::task::CrawlTask;
use crate::storage::{Persister, SqlitePersister};
use crate::{CrawlError, SilkwormError};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Completed pages between progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// What woke the dispatch loop
enum Event {
    Completed(Result<(Id, WorkRecord), JoinError>),
    Enqueued,
    StopRequested,
}

/// Main crawler coordinator structure
pub struct Orchestrator {
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn Parser>,
    persister: Arc<dyn Persister>,
    frontier: FrontierHandle,
    workers: usize,
    max_pages: Option<usize>,
    stop: CancellationToken,
}

impl Orchestrator {
    /// Creates an orchestrator and queues the configured seeds
    ///
    /// # Arguments
    ///
    /// * `config` - Worker count, retry bound, page cap and seeds
    /// * `fetcher` - Source of page bytes
    /// * `parser` - Text and link extraction
    /// * `persister` - Sink for completed pages
    pub fn new(
        config: &CrawlerConfig,
        fetcher: Arc<dyn Fetcher>,
        parser: Arc<dyn Parser>,
        persister: Arc<dyn Persister>,
    ) -> Self {
        let frontier = FrontierHandle::new(RetryPolicy::from_config(config.max_attempts));
        frontier.push(config.seeds.iter().cloned());

        Self {
            fetcher,
            parser,
            persister,
            frontier,
            workers: config.workers.max(1),
            max_pages: (config.max_pages > 0).then_some(config.max_pages),
            stop: CancellationToken::new(),
        }
    }

    /// Creates an orchestrator wired to HTTP, HTML and SQLite
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to run
    /// * `Err(SilkwormError)` - HTTP client or database setup failed
    pub fn from_config(config: &Config) -> Result<Self, SilkwormError> {
        let fetcher = HttpFetcher::new(&config.fetcher)?;
        let persister = SqlitePersister::open(
            Path::new(&config.output.database_path),
            &config.output.table,
        )?;
        tracing::info!(
            "Database {} is ready (table {})",
            config.output.database_path,
            persister.table()
        );

        Ok(Self::new(
            &config.crawler,
            Arc::new(fetcher),
            Arc::new(HtmlParser::new()),
            Arc::new(persister),
        ))
    }

    /// Token that stops new dispatches when cancelled
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn frontier(&self) -> &FrontierHandle {
        &self.frontier
    }

    /// Runs the dispatch loop until the crawl is over
    ///
    /// The loop keeps up to `workers` tasks running. When the frontier is
    /// momentarily empty it sleeps until a task completes, new links are
    /// pushed or the stop token fires. Dispatching ends when the frontier is
    /// empty with nothing in flight, when the page cap is reached or when
    /// the token is cancelled; in every case in-flight tasks are drained
    /// and resolved before the report is built.
    pub async fn run(&self) -> CrawlReport {
        let start = Instant::now();
        let mut tasks: JoinSet<WorkRecord> = JoinSet::new();
        let mut running: HashMap<Id, String> = HashMap::new();
        let mut stop_reason: Option<StopReason> = None;
        let mut dispatched: u64 = 0;
        let mut completed: u64 = 0;

        tracing::info!(
            "Starting to crawl with {} workers, {} URLs queued",
            self.workers,
            self.frontier.frontier_len()
        );

        loop {
            if stop_reason.is_none() {
                stop_reason = self.check_stop();
            }

            if stop_reason.is_none() {
                while tasks.len() < self.workers {
                    let Some(dispatch) = self.frontier.claim_next() else {
                        break;
                    };
                    self.dispatch(&mut tasks, &mut running, dispatch);
                    dispatched += 1;
                }

                if tasks.is_empty() {
                    tracing::info!("Frontier is empty and nothing is in flight, crawl complete");
                    stop_reason = Some(StopReason::FrontierExhausted);
                }
            }

            if tasks.is_empty() {
                break;
            }

            let accepting = stop_reason.is_none();
            let has_capacity = tasks.len() < self.workers;

            let event = tokio::select! {
                Some(joined) = tasks.join_next_with_id() => Event::Completed(joined),
                _ = self.frontier.notified(), if accepting && has_capacity => Event::Enqueued,
                _ = self.stop.cancelled(), if accepting => Event::StopRequested,
            };

            match event {
                Event::Completed(joined) => {
                    self.complete(joined, &mut running);
                    completed += 1;
                    if completed % PROGRESS_INTERVAL == 0 {
                        self.log_progress(start);
                    }
                }
                Event::Enqueued => {}
                Event::StopRequested => {
                    tracing::info!("Stop requested, draining {} in-flight tasks", tasks.len());
                    stop_reason = Some(StopReason::Cancelled);
                }
            }
        }

        let snapshot = self.frontier.snapshot();
        let report = CrawlReport {
            visited: snapshot.visited,
            dispatched,
            failed_attempts: snapshot.failed_attempts,
            abandoned: self.frontier.abandoned(),
            remaining_in_frontier: snapshot.queued,
            stop_reason: stop_reason.unwrap_or(StopReason::FrontierExhausted),
            elapsed: start.elapsed(),
        };

        tracing::info!(
            "Crawl finished ({}): {} pages visited in {:?}",
            report.stop_reason,
            report.visited,
            report.elapsed
        );

        report
    }

    /// Returns why dispatching should stop before the next claim, if it should
    fn check_stop(&self) -> Option<StopReason> {
        if self.stop.is_cancelled() {
            tracing::info!("Stop requested, no new tasks will be dispatched");
            return Some(StopReason::Cancelled);
        }

        if let Some(max_pages) = self.max_pages {
            let visited = self.frontier.visited_count();
            if visited >= max_pages {
                tracing::info!("Visited {} pages, limit is {}; stopping", visited, max_pages);
                return Some(StopReason::MaxPagesReached);
            }
        }

        None
    }

    /// Spawns a crawl task for a claimed URL
    ///
    /// A panic inside the pipeline comes back as a retryable failure so the
    /// URL's in-flight marker is always cleared.
    fn dispatch(
        &self,
        tasks: &mut JoinSet<WorkRecord>,
        running: &mut HashMap<Id, String>,
        dispatch: Dispatch,
    ) {
        tracing::debug!("Dispatching {} (attempt {})", dispatch.url, dispatch.attempt);

        let task = CrawlTask::new(
            self.fetcher.clone(),
            self.parser.clone(),
            self.persister.clone(),
            self.frontier.clone(),
        );
        let url = dispatch.url;

        let handle = tasks.spawn({
            let url = url.clone();
            async move {
                match AssertUnwindSafe(task.run(url.clone())).catch_unwind().await {
                    Ok(record) => record,
                    Err(_) => WorkRecord::failed(url.clone(), CrawlError::TaskPanicked { url }),
                }
            }
        });
        running.insert(handle.id(), url);
    }

    /// Applies a finished task's record to the ledger
    ///
    /// A task that could not be joined is resolved as a panicked attempt of
    /// the URL it was spawned for.
    fn complete(
        &self,
        joined: Result<(Id, WorkRecord), JoinError>,
        running: &mut HashMap<Id, String>,
    ) {
        let record = match joined {
            Ok((id, record)) => {
                running.remove(&id);
                record
            }
            Err(e) => {
                let Some(url) = running.remove(&e.id()) else {
                    tracing::error!("Unknown crawl task could not be joined: {}", e);
                    return;
                };
                tracing::error!("Crawl task for {} could not be joined: {}", url, e);
                WorkRecord::failed(url.clone(), CrawlError::TaskPanicked { url })
            }
        };

        let error = match &record.outcome {
            Ok(()) => None,
            Err(e) => Some(e),
        };

        match self.frontier.resolve(&record) {
            Resolution::Visited => {
                tracing::debug!("{} visited", record.url);
            }
            Resolution::AlreadyVisited => {
                tracing::debug!("{} was already visited", record.url);
            }
            Resolution::Requeued { attempt } => {
                if let Some(e) = error {
                    tracing::warn!("{}; queued for attempt {}", e, attempt);
                }
            }
            Resolution::Abandoned { reason } => {
                let why = match reason {
                    AbandonReason::AttemptsExhausted => "no attempts left",
                    AbandonReason::Unretryable => "cannot be retried",
                };
                if let Some(e) = error {
                    tracing::warn!("Giving up on {} ({}): {}", record.url, why, e);
                }
            }
            Resolution::Dropped => {
                tracing::warn!("Dropping attempt with blank URL");
            }
        }
    }

    fn log_progress(&self, start: Instant) {
        let snapshot = self.frontier.snapshot();
        let elapsed = start.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            snapshot.visited as f64 / elapsed
        } else {
            0.0
        };

        tracing::info!(
            "Progress: {} pages visited, {} in frontier, {} in flight, {:.2} pages/sec",
            snapshot.visited,
            snapshot.queued,
            snapshot.in_flight,
            rate
        );
    }
}
