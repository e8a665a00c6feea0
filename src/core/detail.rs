use crate::config::toml_config::{ScreenshotConfig, Selectors, SiteConfig, Timing};
use crate::core::screenshot::{crop_png, CropRect};
use crate::domain::model::{OutageRecord, Stage};
use crate::domain::ports::{PageElement, PageSession, Storage};
use crate::utils::error::{Result, ScrapeError};
use std::time::Duration;

/// Reads the outage panel of one sub-region's page.
pub struct OutageDetailReader<S: Storage> {
    selectors: Selectors,
    timing: Timing,
    screenshot: ScreenshotConfig,
    storage: S,
}

impl<S: Storage> OutageDetailReader<S> {
    pub fn new(config: &SiteConfig, storage: S) -> Self {
        Self {
            selectors: config.selectors.clone(),
            timing: config.timing.clone(),
            screenshot: config.screenshot.clone(),
            storage,
        }
    }

    /// Expects the session to already show the sub-region's page.
    pub async fn read<P: PageSession>(
        &self,
        session: &P,
        sub_region: &str,
    ) -> Result<OutageRecord> {
        tokio::time::sleep(self.timing.detail_settle()).await;

        self.accept_consent(session).await?;

        if self.screenshot.enabled {
            if let Err(e) = self.save_screenshot(session, sub_region).await {
                tracing::warn!(sub_region, error = %e, "⚠️ Could not save screenshot");
            }
        }

        let lines = self.timestamp_lines(session).await?;
        let (start_time, end_time, affected_customers) = parse_timestamp_lines(&lines)?;

        let info_text = self.required_text(session, &self.selectors.info_text).await?;
        let last_update = self
            .required_text(session, &self.selectors.last_updated)
            .await?;

        let record = OutageRecord {
            sub_region: sub_region.to_string(),
            start_time,
            end_time,
            info_text,
            last_update,
            affected_customers,
        };
        tracing::debug!(?record, "Outage record created");
        Ok(record)
    }

    /// Clicks the cookie consent button when the dialog is showing.
    async fn accept_consent<P: PageSession>(&self, session: &P) -> Result<()> {
        match session
            .find_element(&self.selectors.consent_button, self.timing.consent_wait())
            .await?
        {
            Some(button) => match button.click().await {
                Ok(()) => {
                    tracing::info!("Accepted cookies, waiting for the dialog to close");
                    tokio::time::sleep(self.timing.consent_settle()).await;
                }
                Err(e) => tracing::warn!(error = %e, "Cookie dialog found but could not be clicked"),
            },
            None => tracing::debug!("Cookies already accepted"),
        }
        Ok(())
    }

    async fn save_screenshot<P: PageSession>(&self, session: &P, sub_region: &str) -> Result<()> {
        tracing::info!(sub_region, "Taking screenshot");

        let viewport = session.viewport_size().await?;
        let rect = CropRect::inset(viewport, &self.screenshot)?;
        let png = session.capture_screenshot().await?;
        let cropped = crop_png(&png, rect)?;

        self.storage
            .write_file(&self.screenshot.file_name(sub_region), &cropped)
            .await
    }

    async fn timestamp_lines<P: PageSession>(&self, session: &P) -> Result<Vec<String>> {
        let wait = self.timing.element_wait();
        let container = session
            .find_element(&self.selectors.timestamps_container, wait)
            .await?
            .ok_or_else(|| missing(&self.selectors.timestamps_container))?;

        let block = container
            .find_element(&self.selectors.timestamps_block, wait)
            .await?
            .ok_or_else(|| missing(&self.selectors.timestamps_block))?;

        let mut lines = Vec::new();
        for line in block
            .find_elements(&self.selectors.timestamps_line, Duration::ZERO)
            .await?
        {
            lines.push(line.text().await?);
        }
        Ok(lines)
    }

    async fn required_text<P: PageSession>(&self, session: &P, selector: &str) -> Result<String> {
        let element = session
            .find_element(selector, self.timing.element_wait())
            .await?
            .ok_or_else(|| missing(selector))?;
        element.text().await
    }
}

fn missing(selector: &str) -> ScrapeError {
    ScrapeError::mismatch(Stage::SubRegion, format!("element '{}' not found", selector))
}

/// Text after the first colon, trimmed.
fn labeled_value(line: &str) -> Result<String> {
    line.split_once(':')
        .map(|(_, value)| value.trim().to_string())
        .ok_or_else(|| {
            ScrapeError::mismatch(Stage::SubRegion, format!("no label separator in '{}'", line))
        })
}

/// Start time, end time and affected-customer count from the first three
/// lines of the timestamps panel.
fn parse_timestamp_lines(lines: &[String]) -> Result<(String, String, u64)> {
    let [start, end, affected, ..] = lines else {
        return Err(ScrapeError::mismatch(
            Stage::SubRegion,
            format!("timestamps panel has {} lines, expected 3", lines.len()),
        ));
    };

    let start_time = labeled_value(start)?;
    let end_time = labeled_value(end)?;

    let affected = labeled_value(affected)?;
    let count = affected.split(' ').next().unwrap_or_default();
    let affected_customers = count.parse::<u64>().map_err(|e| {
        ScrapeError::mismatch(
            Stage::SubRegion,
            format!("affected customers '{}' is not a number: {}", affected, e),
        )
    })?;

    Ok((start_time, end_time, affected_customers))
}
