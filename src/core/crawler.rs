//! Three-level traversal of the outage map.
//!
//! The nation listing decides which regions to open, each region listing
//! decides which sub-regions to open, and every opened sub-region yields one
//! record. Levels run strictly in order because each consumes the previous
//! level's filtered output. Within a level, visits are serial: they share
//! one browsing session.

use crate::config::toml_config::{SiteConfig, Timing};
use crate::core::catalog::normalize;
use crate::core::detail::OutageDetailReader;
use crate::core::shutdown::Shutdown;
use crate::core::table::{outage_rows, TableExtractor};
use crate::domain::model::{CycleState, OutageRecord, OutageRow, RegionId, Stage};
use crate::domain::ports::{PageSession, Storage};
use crate::utils::error::{Result, ScrapeError};
use url::Url;

pub struct HierarchicalCrawler<P: PageSession, S: Storage> {
    session: P,
    config: SiteConfig,
    table: TableExtractor,
    detail: OutageDetailReader<S>,
}

impl<P: PageSession, S: Storage> HierarchicalCrawler<P, S> {
    pub fn new(session: P, config: SiteConfig, storage: S) -> Self {
        let table = TableExtractor::new(&config.selectors.row, &config.selectors.cell);
        let detail = OutageDetailReader::new(&config, storage);
        Self {
            session,
            config,
            table,
            detail,
        }
    }

    pub fn session(&self) -> &P {
        &self.session
    }

    pub fn into_session(self) -> P {
        self.session
    }

    fn timing(&self) -> &Timing {
        &self.config.timing
    }

    /// Runs one full traversal into a fresh [`CycleState`].
    ///
    /// Fails only when the nation listing cannot be read or shutdown is
    /// requested; region and sub-region failures are recorded as anomalies
    /// and the remaining branches are still visited.
    pub async fn crawl(&self, shutdown: &Shutdown) -> Result<CycleState> {
        let mut state = CycleState::new();

        state.regions_with_outage = self.regions_with_outage().await?;
        tracing::info!(
            count = state.regions_with_outage.len(),
            "Found regions with outages"
        );

        self.collect_sub_regions(&mut state, shutdown).await?;
        tracing::info!(
            count = state.sub_regions_with_outage.len(),
            "Found sub-regions with outages"
        );

        self.collect_outages(&mut state, shutdown).await?;

        Ok(state)
    }

    /// Nation level: region tokens whose row reports an outage.
    pub async fn regions_with_outage(&self) -> Result<Vec<RegionId>> {
        tracing::info!("Checking for regions with outages");
        let root = self.config.root_url()?;
        let rows = self.listing_rows(&root, Stage::Nation).await?;

        Ok(outage_rows(rows)
            .map(|row| {
                tracing::info!(region = %row.display_name, "Found outages");
                normalize(&row.display_name)
            })
            .collect())
    }

    /// Region level: lowercase names of the sub-regions reporting an outage.
    pub async fn sub_regions_with_outage(&self, region: &RegionId) -> Result<Vec<String>> {
        let url = self.config.region_url(region)?;
        let rows = self.listing_rows(&url, Stage::Region).await?;

        Ok(outage_rows(rows)
            .map(|row| {
                tracing::info!(%region, sub_region = %row.display_name, "Found outages");
                row.display_name.to_lowercase()
            })
            .collect())
    }

    async fn collect_sub_regions(&self, state: &mut CycleState, shutdown: &Shutdown) -> Result<()> {
        for region in state.regions_with_outage.clone() {
            if shutdown.is_triggered() {
                return Err(ScrapeError::Cancelled);
            }

            match self.sub_regions_with_outage(&region).await {
                Ok(names) => state.sub_regions_with_outage.extend(names),
                Err(e) if e.is_page_failure() => {
                    tracing::warn!(stage = %Stage::Region, %region, error = %e, "Skipping region");
                    state.record_anomaly(Stage::Region, region.as_str(), &e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn collect_outages(&self, state: &mut CycleState, shutdown: &Shutdown) -> Result<()> {
        for sub_region in state.sub_regions_with_outage.clone() {
            if shutdown.is_triggered() {
                return Err(ScrapeError::Cancelled);
            }

            match self.read_sub_region(&sub_region).await {
                Ok(record) => state.outages.push(record),
                Err(e) if e.is_page_failure() => {
                    tracing::warn!(
                        stage = %Stage::SubRegion,
                        sub_region = %sub_region,
                        error = %e,
                        "Skipping sub-region"
                    );
                    state.record_anomaly(Stage::SubRegion, sub_region.as_str(), &e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Sub-region level: navigate and read the detail panel.
    pub async fn read_sub_region(&self, sub_region: &str) -> Result<OutageRecord> {
        let url = self.config.sub_region_url(sub_region)?;
        tracing::info!(sub_region, %url, "Fetching outage details");

        self.session
            .navigate(&url, self.timing().navigation_timeout())
            .await?;
        self.detail.read(&self.session, sub_region).await
    }

    async fn listing_rows(&self, url: &Url, stage: Stage) -> Result<Vec<OutageRow>> {
        tracing::debug!(%stage, %url, "Loading location listing");
        self.session
            .navigate(url, self.timing().navigation_timeout())
            .await?;
        tokio::time::sleep(self.timing().listing_settle()).await;

        let table = self
            .session
            .find_element(
                &self.config.selectors.location_table,
                self.timing().element_wait(),
            )
            .await?
            .ok_or_else(|| {
                ScrapeError::mismatch(
                    stage,
                    format!(
                        "location table '{}' not found on {}",
                        self.config.selectors.location_table, url
                    ),
                )
            })?;

        let rows = self.table.extract_rows(&table, stage).await?;
        for row in &rows {
            tracing::debug!(
                name = %row.display_name,
                a = %row.indicator_a,
                b = %row.indicator_b,
                "Listing row"
            );
        }
        Ok(rows)
    }
}
