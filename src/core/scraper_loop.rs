use crate::core::crawler::HierarchicalCrawler;
use crate::core::shutdown::Shutdown;
use crate::core::snapshot::SnapshotWriter;
use crate::domain::ports::{PageSession, Storage};
use crate::utils::error::ScrapeError;
use crate::utils::monitor::SystemMonitor;
use std::time::Duration;

/// Shortest pause between cycles, to stay clear of the site's rate limits.
pub const MIN_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPolicy {
    pub interval: Duration,
    pub clamped: bool,
}

impl IntervalPolicy {
    /// Raises intervals below [`MIN_INTERVAL_SECS`], zero and negative
    /// values included, to the minimum.
    pub fn resolve(requested_secs: i64) -> Self {
        if requested_secs < MIN_INTERVAL_SECS as i64 {
            Self {
                interval: Duration::from_secs(MIN_INTERVAL_SECS),
                clamped: true,
            }
        } else {
            Self {
                interval: Duration::from_secs(requested_secs.unsigned_abs()),
                clamped: false,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Written { records: usize, anomalies: usize },
    /// Nothing was written; the previous snapshot is still in place.
    Skipped { reason: String },
}

/// Crawl, write, sleep, repeat.
pub struct ScraperLoop<P: PageSession, S: Storage> {
    crawler: HierarchicalCrawler<P, S>,
    writer: SnapshotWriter<S>,
    monitor: SystemMonitor,
}

impl<P: PageSession, S: Storage> ScraperLoop<P, S> {
    pub fn new(crawler: HierarchicalCrawler<P, S>, writer: SnapshotWriter<S>) -> Self {
        Self::new_with_monitoring(crawler, writer, false)
    }

    pub fn new_with_monitoring(
        crawler: HierarchicalCrawler<P, S>,
        writer: SnapshotWriter<S>,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            crawler,
            writer,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn crawler(&self) -> &HierarchicalCrawler<P, S> {
        &self.crawler
    }

    pub fn into_crawler(self) -> HierarchicalCrawler<P, S> {
        self.crawler
    }

    /// One cycle. A nation-level failure or a shutdown skips the write so
    /// the last good snapshot is kept instead of being replaced by an
    /// empty or partial one.
    pub async fn run_cycle(&self, shutdown: &Shutdown) -> CycleOutcome {
        tracing::info!("🚀 Starting crawl cycle");

        let state = match self.crawler.crawl(shutdown).await {
            Ok(state) => state,
            Err(ScrapeError::Cancelled) => {
                tracing::info!("Cycle cancelled, snapshot left untouched");
                return CycleOutcome::Skipped {
                    reason: ScrapeError::Cancelled.to_string(),
                };
            }
            Err(e) => {
                tracing::error!(error = %e, "❌ Cycle aborted, keeping previous snapshot");
                return CycleOutcome::Skipped {
                    reason: e.to_string(),
                };
            }
        };
        self.monitor.log_stats("crawl");

        for anomaly in &state.anomalies {
            tracing::warn!(
                stage = %anomaly.stage,
                identifier = %anomaly.identifier,
                cause = %anomaly.cause,
                "Cycle anomaly"
            );
        }

        if let Err(e) = self.writer.write(&state.outages).await {
            tracing::error!(
                error = %e,
                file = %self.writer.file_name(),
                "❌ Failed to write snapshot"
            );
            return CycleOutcome::Skipped {
                reason: e.to_string(),
            };
        }
        self.monitor.log_stats("write");

        tracing::info!(
            regions = state.regions_with_outage.len(),
            sub_regions = state.sub_regions_with_outage.len(),
            records = state.outages.len(),
            anomalies = state.anomalies.len(),
            "✅ Cycle complete"
        );

        CycleOutcome::Written {
            records: state.outages.len(),
            anomalies: state.anomalies.len(),
        }
    }

    /// Runs cycles until `shutdown` fires. The pause after a cycle happens
    /// whether or not the cycle succeeded.
    pub async fn run(&self, interval_secs: i64, mut shutdown: Shutdown) {
        let policy = IntervalPolicy::resolve(interval_secs);
        if policy.clamped {
            tracing::warn!(
                requested = interval_secs,
                "Run interval is less than {} seconds, setting to {}!",
                MIN_INTERVAL_SECS,
                MIN_INTERVAL_SECS
            );
        }

        loop {
            if shutdown.is_triggered() {
                break;
            }

            self.run_cycle(&shutdown).await;

            tracing::info!(
                "Sleeping for {} seconds to not get rate limited",
                policy.interval.as_secs()
            );
            tokio::select! {
                _ = tokio::time::sleep(policy.interval) => {}
                _ = shutdown.triggered() => break,
            }
        }

        tracing::info!("Scraper loop stopped");
    }
}
