//! The scrape → parse → diff → notify → persist cycle, and the loop that
//! repeats it.

use crate::error::{ErrorKind, Result};
use crate::schedule::Schedule;
use carwatch_config::{Config, SearchConfig};
use carwatch_extract::{Criteria, Extractor, Listing};
use carwatch_fetch::{FetcherHandle, Url};
use carwatch_notify::{Notifier, Outcome, Report};
use carwatch_store::{Classified, JsonStore, classify, removed};
use derive_more::Display;
use exn::ResultExt;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::instrument;

/// Where the monitor is within a cycle.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Parsing,
    Detecting,
    Notifying,
    Persisting,
}

/// What a completed cycle saw and did.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Every listing that passed the filters, flagged first-seen or not.
    pub listings: Vec<Classified>,
    /// Listings from the previous snapshot that have disappeared.
    pub removed: Vec<Listing>,
    /// Size of the known set after the cycle.
    pub known: usize,
    /// `None` when nothing was sent (dry run, or no new listings).
    pub notification: Option<Report>,
    pub persisted: bool,
}
impl CycleReport {
    pub fn new_listings(&self) -> impl Iterator<Item = &Listing> {
        self.listings.iter().filter(|c| c.is_first_seen).map(|c| &c.listing)
    }

    pub fn new_count(&self) -> usize {
        self.new_listings().count()
    }
}

pub struct Monitor {
    fetcher: FetcherHandle,
    store: JsonStore,
    notifier: Notifier,
    search: SearchConfig,
    search_url: Url,
    schedule: Schedule,
    retry_backoff: Duration,
    dry_run: bool,
    phase: Phase,
}

impl Monitor {
    pub fn new(
        fetcher: FetcherHandle,
        store: JsonStore,
        notifier: Notifier,
        search: SearchConfig,
        schedule: Schedule,
    ) -> Result<Self> {
        let search_url = carwatch_fetch::search_url(&search).or_raise(|| ErrorKind::Config)?;
        Ok(Self {
            fetcher,
            store,
            notifier,
            search,
            search_url,
            schedule,
            retry_backoff: Duration::from_secs(60),
            dry_run: false,
            phase: Phase::Idle,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = carwatch_fetch::from_config(&config.fetch).or_raise(|| ErrorKind::Fetch)?;
        let notifier = Notifier::from_config(&config.notification).or_raise(|| ErrorKind::Notify)?;
        let schedule = Schedule::from_config(&config.schedule)?;
        Ok(Self::new(fetcher, JsonStore::from_config(&config.store), notifier, config.search.clone(), schedule)?
            .with_retry_backoff(config.schedule.retry_backoff()))
    }

    /// Fetch and classify, but never notify or write anything.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Pause after a panicking cycle, instead of the normal schedule.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }

    /// Run a single cycle. Afterwards the monitor is always back in
    /// [`Phase::Idle`], whether or not the cycle succeeded.
    pub async fn cycle(&mut self) -> Result<CycleReport> {
        let result = self.run_cycle().await;
        self.enter(Phase::Idle);
        result
    }

    #[instrument(skip(self), fields(fetcher = self.fetcher.name(), dry_run = self.dry_run))]
    async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.enter(Phase::Fetching);
        let html = self.fetcher.fetch(&self.search_url).await.or_raise(|| ErrorKind::Fetch)?;

        self.enter(Phase::Parsing);
        let listings = Extractor::from_html(&html)
            .with_source_url(self.search_url.as_str())
            .with_max_hops(self.search.ancestor_hops)
            .listings(&self.search.name_filter);
        if listings.is_empty() {
            tracing::warn!("No listings found on the search page; the site layout may have changed");
            return Ok(self.idle_report().await);
        }
        let criteria = Criteria {
            price_max: self.search.price_max.map(f64::from),
            year_min: self.search.year_min,
        };
        let parsed = listings.len();
        let listings = criteria.apply(listings);
        if listings.is_empty() {
            tracing::info!(parsed, "All listings filtered out by price or year");
            return Ok(self.idle_report().await);
        }

        self.enter(Phase::Detecting);
        let mut known = self.store.load().await;
        let classified = classify(&listings, &known);
        let new: Vec<Listing> = classified
            .iter()
            .filter(|c| c.is_first_seen)
            .map(|c| c.listing.clone())
            .collect();
        let removed = if self.store.tracks_snapshot() {
            removed(&self.store.load_snapshot().await, &listings)
        } else {
            Vec::new()
        };
        tracing::info!(found = listings.len(), new = new.len(), removed = removed.len(), "Listings classified");
        for listing in &new {
            tracing::info!(name = %listing.name, price = %listing.price, "New listing");
        }
        for listing in &removed {
            tracing::info!(name = %listing.name, price = %listing.price, "Listing no longer present");
        }

        let mut report = CycleReport {
            listings: classified,
            removed,
            known: known.len(),
            notification: None,
            persisted: false,
        };
        if self.dry_run {
            return Ok(report);
        }

        self.enter(Phase::Notifying);
        if new.is_empty() {
            tracing::info!("No new listings");
            if let outcome @ Outcome::Failed(_) = self.notifier.send_status(known.len(), self.search_url.as_str()).await {
                tracing::debug!(%outcome, "Heartbeat not delivered");
            }
        } else {
            let notification = self.notifier.notify(&new, self.search_url.as_str()).await;
            tracing::info!(%notification, "Notifications dispatched");
            report.notification = Some(notification);
        }

        // Persisted whatever the notification outcome: an unsent alert is
        // preferable to the same alert on every cycle.
        self.enter(Phase::Persisting);
        known.apply(new);
        report.known = known.len();
        match self.store.save(&known).await {
            Ok(()) => report.persisted = true,
            Err(err) => tracing::error!(error = ?err, "Failed to save known listings; they will be reported again"),
        }
        if let Err(err) = self.store.save_snapshot(&listings).await {
            tracing::warn!(error = ?err, "Failed to save listing snapshot");
        }
        Ok(report)
    }

    /// Run one cycle (`once`), or cycle on the schedule until Ctrl-C.
    pub async fn run(&mut self, once: bool) -> Result<()> {
        self.run_until(once, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = ?err, "Unable to listen for Ctrl-C; stop the process to exit");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// As [`run`](Self::run), stopping when `shutdown` resolves.
    pub async fn run_until(&mut self, once: bool, shutdown: impl Future<Output = ()>) -> Result<()> {
        if once {
            return self.cycle().await.map(|_| ());
        }
        tracing::info!(schedule = %self.schedule, search = %self.search.describe(), "Monitoring started");
        let mut shutdown = std::pin::pin!(shutdown);
        loop {
            let outcome = tokio::select! {
                outcome = AssertUnwindSafe(self.cycle()).catch_unwind() => outcome,
                () = &mut shutdown => break,
            };
            let delay = match outcome {
                Ok(Ok(report)) => {
                    tracing::info!(new = report.new_count(), known = report.known, "Cycle complete");
                    self.schedule.delay_from(OffsetDateTime::now_utc())
                },
                Ok(Err(err)) => {
                    tracing::warn!(error = ?err, "Cycle failed; skipping until the next scheduled check");
                    self.schedule.delay_from(OffsetDateTime::now_utc())
                },
                Err(panic) => {
                    self.phase = Phase::Idle;
                    let err = crate::error::Error::from(ErrorKind::Panic(panic_message(panic.as_ref())));
                    tracing::error!(error = ?err, backoff = ?self.retry_backoff, "Cycle panicked; retrying after backoff");
                    self.retry_backoff
                },
            };
            tracing::debug!(seconds = delay.as_secs(), "Sleeping until next check");
            tokio::select! {
                () = tokio::time::sleep(delay) => {},
                () = &mut shutdown => break,
            }
        }
        tracing::info!("Shutting down");
        Ok(())
    }

    /// Report for a cycle that found nothing to classify.
    async fn idle_report(&self) -> CycleReport {
        CycleReport {
            known: self.store.load().await.len(),
            ..CycleReport::default()
        }
    }

    fn enter(&mut self, phase: Phase) {
        tracing::trace!(from = %self.phase, to = %phase, "Phase change");
        self.phase = phase;
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
