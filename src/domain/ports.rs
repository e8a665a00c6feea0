use crate::domain::model::Viewport;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Filesystem-like sink for the artifacts a cycle produces.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    /// Replaces the whole file. Readers never observe a partially written
    /// file.
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// An element located on the current page.
#[async_trait]
pub trait PageElement: Send + Sync + Sized {
    async fn text(&self) -> Result<String>;
    async fn click(&self) -> Result<()>;
    /// First descendant matching `selector`, polling for up to `wait`.
    async fn find_element(&self, selector: &str, wait: Duration) -> Result<Option<Self>>;
    /// All descendants matching `selector`; empty once `wait` has elapsed
    /// without a match.
    async fn find_elements(&self, selector: &str, wait: Duration) -> Result<Vec<Self>>;
}

/// One browsing session. Navigations are sequential: the session owns a
/// single tab and the crawler holds the session exclusively.
#[async_trait]
pub trait PageSession: Send + Sync {
    type Element: PageElement;

    async fn navigate(&self, url: &Url, timeout: Duration) -> Result<()>;
    async fn find_element(&self, selector: &str, wait: Duration) -> Result<Option<Self::Element>>;
    async fn find_elements(&self, selector: &str, wait: Duration) -> Result<Vec<Self::Element>>;
    /// PNG of the current viewport.
    async fn capture_screenshot(&self) -> Result<Vec<u8>>;
    async fn viewport_size(&self) -> Result<Viewport>;
}
