pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::browser::ChromiumSession;
pub use adapters::storage::LocalStorage;
pub use config::SiteConfig;
pub use crate::core::{crawler::HierarchicalCrawler, scraper_loop::ScraperLoop, snapshot::SnapshotWriter};
pub use utils::error::{Result, ScrapeError};
