//! Headless Chromium implementation of [`PageSession`].
//!
//! One browser process, one tab. Lookups poll the DOM until the element
//! shows up or the caller's wait runs out, so a page that never renders the
//! expected structure ends in `None` instead of hanging.

use crate::config::toml_config::BrowserConfig as BrowserSettings;
use crate::domain::model::Viewport;
use crate::domain::ports::{PageElement, PageSession};
use crate::utils::error::{Result, ScrapeError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use url::Url;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Lower bound for one lookup attempt, so a zero wait still gets a full try.
const ATTEMPT_FLOOR: Duration = Duration::from_secs(5);
/// Upper bound for single DevTools commands (click, text, screenshot).
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

const VIEWPORT_SCRIPT: &str = "({ width: window.innerWidth, height: window.innerHeight })";

fn browser_error(e: impl Display) -> ScrapeError {
    ScrapeError::Browser(e.to_string())
}

async fn bounded<T, E, F>(what: &str, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(COMMAND_TIMEOUT, fut).await {
        Ok(result) => result.map_err(browser_error),
        Err(_) => Err(ScrapeError::Timeout {
            what: what.to_string(),
            after: COMMAND_TIMEOUT,
        }),
    }
}

/// Retries `attempt` until it succeeds or `wait` has passed. At least one
/// attempt is always made.
async fn poll_until<T, E, F, Fut>(selector: &str, wait: Duration, mut attempt: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Display,
{
    let deadline = Instant::now() + wait;
    loop {
        let remaining = deadline
            .saturating_duration_since(Instant::now())
            .max(ATTEMPT_FLOOR);
        match tokio::time::timeout(remaining, attempt()).await {
            Ok(Ok(found)) => return Some(found),
            Ok(Err(e)) => tracing::trace!(selector, error = %e, "Element not available yet"),
            Err(_) => tracing::trace!(selector, "Element lookup timed out"),
        }

        if Instant::now() + POLL_INTERVAL > deadline {
            return None;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

pub struct ChromiumElement {
    inner: Element,
}

#[async_trait]
impl PageElement for ChromiumElement {
    async fn text(&self) -> Result<String> {
        let text = bounded("element text", self.inner.inner_text()).await?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn click(&self) -> Result<()> {
        bounded("element click", self.inner.click()).await?;
        Ok(())
    }

    async fn find_element(&self, selector: &str, wait: Duration) -> Result<Option<Self>> {
        Ok(
            poll_until(selector, wait, || self.inner.find_element(selector))
                .await
                .map(|inner| ChromiumElement { inner }),
        )
    }

    async fn find_elements(&self, selector: &str, wait: Duration) -> Result<Vec<Self>> {
        let found = poll_until(selector, wait, || async {
            match self.inner.find_elements(selector).await {
                Ok(elements) if elements.is_empty() => Err("no match".to_string()),
                Ok(elements) => Ok(elements),
                Err(e) => Err(e.to_string()),
            }
        })
        .await
        .unwrap_or_default();

        Ok(found
            .into_iter()
            .map(|inner| ChromiumElement { inner })
            .collect())
    }
}

/// A launched browser with a single tab.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut builder =
            BrowserConfig::builder().window_size(settings.window_width, settings.window_height);
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(browser_error)?;

        let (browser, mut events) = Browser::launch(config).await.map_err(browser_error)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "Browser event error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(browser_error)?;

        tracing::info!(
            headless = settings.headless,
            width = settings.window_width,
            height = settings.window_height,
            "Browser session started"
        );

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    pub async fn close(&mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "Browser did not close cleanly");
        }
        self.handler.abort();
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    type Element = ChromiumElement;

    async fn navigate(&self, url: &Url, timeout: Duration) -> Result<()> {
        tracing::info!(%url, "GET request sent");
        match tokio::time::timeout(timeout, self.page.goto(url.as_str())).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ScrapeError::NavigationFailure {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(ScrapeError::NavigationFailure {
                url: url.to_string(),
                reason: format!("no response within {:?}", timeout),
            }),
        }
    }

    async fn find_element(&self, selector: &str, wait: Duration) -> Result<Option<ChromiumElement>> {
        Ok(
            poll_until(selector, wait, || self.page.find_element(selector))
                .await
                .map(|inner| ChromiumElement { inner }),
        )
    }

    async fn find_elements(&self, selector: &str, wait: Duration) -> Result<Vec<ChromiumElement>> {
        let found = poll_until(selector, wait, || async {
            match self.page.find_elements(selector).await {
                Ok(elements) if elements.is_empty() => Err("no match".to_string()),
                Ok(elements) => Ok(elements),
                Err(e) => Err(e.to_string()),
            }
        })
        .await
        .unwrap_or_default();

        Ok(found
            .into_iter()
            .map(|inner| ChromiumElement { inner })
            .collect())
    }

    async fn capture_screenshot(&self) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        bounded("screenshot", self.page.screenshot(params)).await
    }

    async fn viewport_size(&self) -> Result<Viewport> {
        let result = bounded("viewport size", self.page.evaluate(VIEWPORT_SCRIPT)).await?;
        result.into_value::<Viewport>().map_err(browser_error)
    }
}
