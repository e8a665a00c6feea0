#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbaImage};
use outage_scraper::config::toml_config::{SiteConfig, Timing};
use outage_scraper::core::catalog::normalize;
use outage_scraper::domain::model::Viewport;
use outage_scraper::domain::ports::{PageElement, PageSession};
use outage_scraper::{Result, ScrapeError};
use std::collections::HashMap;
use std::io::{self, Cursor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;
use url::Url;

pub const VIEWPORT: Viewport = Viewport {
    width: 1200,
    height: 800,
};

/// Site configuration with the default selectors and no settle delays.
pub fn test_config() -> SiteConfig {
    SiteConfig {
        timing: Timing::immediate(),
        ..SiteConfig::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    content: String,
    children: HashMap<String, Vec<FakeElement>>,
    clicks: Arc<AtomicUsize>,
}

impl FakeElement {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            ..Self::default()
        }
    }

    pub fn with_children(mut self, selector: &str, children: Vec<FakeElement>) -> Self {
        self.children.insert(selector.to_string(), children);
        self
    }

    pub fn click_count(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageElement for FakeElement {
    async fn text(&self) -> Result<String> {
        Ok(self.content.clone())
    }

    async fn click(&self) -> Result<()> {
        self.clicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find_element(&self, selector: &str, _wait: Duration) -> Result<Option<Self>> {
        Ok(self
            .children
            .get(selector)
            .and_then(|found| found.first())
            .cloned())
    }

    async fn find_elements(&self, selector: &str, _wait: Duration) -> Result<Vec<Self>> {
        Ok(self.children.get(selector).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    elements: HashMap<String, Vec<FakeElement>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: &str, element: FakeElement) -> Self {
        self.elements
            .entry(selector.to_string())
            .or_default()
            .push(element);
        self
    }

    pub fn without(mut self, selector: &str) -> Self {
        self.elements.remove(selector);
        self
    }
}

fn cells(values: [&str; 3]) -> FakeElement {
    FakeElement::new("").with_children("td", values.iter().map(|v| FakeElement::new(v)).collect())
}

/// A location listing: header row, one row per entry, totals row.
pub fn listing(rows: &[(&str, &str, &str)]) -> FakePage {
    let config = SiteConfig::default();

    let mut table_rows = vec![FakeElement::new("").with_children(
        "th",
        vec![
            FakeElement::new("Område"),
            FakeElement::new("Avbrott"),
            FakeElement::new("Planerade"),
        ],
    )];
    table_rows.extend(rows.iter().map(|(name, a, b)| cells([name, a, b])));
    table_rows.push(cells(["Totalt", "99", "99"]));

    let table = FakeElement::new("").with_children(&config.selectors.row, table_rows);
    FakePage::new().with(&config.selectors.location_table, table)
}

pub struct Detail<'a> {
    pub start: &'a str,
    pub end: &'a str,
    pub customers: &'a str,
    pub info: &'a str,
    pub updated: &'a str,
}

impl Default for Detail<'_> {
    fn default() -> Self {
        Self {
            start: "2024-01-05 10:00",
            end: "2024-01-05 14:00",
            customers: "12 st",
            info: "Vi felsöker störningen.",
            updated: "Senast uppdaterad 10:05",
        }
    }
}

/// A sub-region detail page, with the consent dialog when `consent` is set.
pub fn detail_page(detail: Detail<'_>, consent: Option<&FakeElement>) -> FakePage {
    let selectors = SiteConfig::default().selectors;

    let block = FakeElement::new("").with_children(
        &selectors.timestamps_line,
        vec![
            FakeElement::new(&format!("Start: {}", detail.start)),
            FakeElement::new(&format!("Beräknat klart: {}", detail.end)),
            FakeElement::new(&format!("Berörda kunder: {}", detail.customers)),
        ],
    );
    let container = FakeElement::new("").with_children(&selectors.timestamps_block, vec![block]);

    let mut page = FakePage::new()
        .with(&selectors.timestamps_container, container)
        .with(&selectors.info_text, FakeElement::new(detail.info))
        .with(&selectors.last_updated, FakeElement::new(detail.updated));

    if let Some(button) = consent {
        page = page.with(&selectors.consent_button, button.clone());
    }
    page
}

/// An in-memory site keyed by URL.
#[derive(Debug, Default)]
pub struct FakeSession {
    pages: HashMap<String, FakePage>,
    current: Mutex<Option<String>>,
    visits: Mutex<Vec<String>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: Url, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn nation(self, page: FakePage) -> Self {
        let url = test_config().root_url().unwrap();
        self.page(url, page)
    }

    pub fn region(self, label: &str, page: FakePage) -> Self {
        let url = test_config().region_url(&normalize(label)).unwrap();
        self.page(url, page)
    }

    pub fn sub_region(self, name: &str, page: FakePage) -> Self {
        let url = test_config().sub_region_url(name).unwrap();
        self.page(url, page)
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }

    fn current_page(&self) -> Option<FakePage> {
        let current = self.current.lock().unwrap();
        current.as_ref().and_then(|url| self.pages.get(url)).cloned()
    }
}

#[async_trait]
impl PageSession for FakeSession {
    type Element = FakeElement;

    async fn navigate(&self, url: &Url, _timeout: Duration) -> Result<()> {
        self.visits.lock().unwrap().push(url.to_string());
        if self.pages.contains_key(url.as_str()) {
            *self.current.lock().unwrap() = Some(url.to_string());
            Ok(())
        } else {
            *self.current.lock().unwrap() = None;
            Err(ScrapeError::NavigationFailure {
                url: url.to_string(),
                reason: "404".to_string(),
            })
        }
    }

    async fn find_element(&self, selector: &str, _wait: Duration) -> Result<Option<FakeElement>> {
        Ok(self
            .current_page()
            .and_then(|page| page.elements.get(selector).and_then(|e| e.first()).cloned()))
    }

    async fn find_elements(&self, selector: &str, _wait: Duration) -> Result<Vec<FakeElement>> {
        Ok(self
            .current_page()
            .and_then(|page| page.elements.get(selector).cloned())
            .unwrap_or_default())
    }

    async fn capture_screenshot(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(RgbaImage::new(VIEWPORT.width, VIEWPORT.height))
            .write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }

    async fn viewport_size(&self) -> Result<Viewport> {
        Ok(VIEWPORT)
    }
}

/// Formatted log output collected in memory.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Routes this thread's events into a [`CapturedLogs`] until the guard drops.
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
