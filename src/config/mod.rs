pub mod toml_config;

pub use toml_config::SiteConfig;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "outage-scraper")]
#[command(about = "Periodically snapshots active power outages from a utility's outage map")]
pub struct CliConfig {
    /// Seconds between crawl cycles (raised to 60 if lower)
    #[arg(default_value_t = 60, allow_negative_numbers = true)]
    pub interval: i64,

    /// TOML file overriding site URLs, selectors and timing
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory receiving the snapshot and screenshots
    #[arg(long, default_value = ".")]
    pub output_dir: String,

    /// Snapshot file name inside the output directory
    #[arg(long, default_value = "outdata.json")]
    pub snapshot_file: String,

    /// Write logs to this file instead of stderr; `auto` names it after the start time
    #[arg(long)]
    pub log_file: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log process CPU and memory after each cycle phase
    #[arg(long)]
    pub monitor: bool,

    /// Run one cycle and exit
    #[arg(long)]
    pub once: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn log_path(&self) -> Option<PathBuf> {
        match self.log_file.as_deref() {
            Some("auto") => Some(PathBuf::from(crate::utils::logger::timestamped_log_name(
                chrono::Local::now(),
            ))),
            Some(path) => Some(PathBuf::from(path)),
            None => None,
        }
    }

    pub fn site_config(&self) -> Result<SiteConfig> {
        match &self.config {
            Some(path) => SiteConfig::from_file(path),
            None => Ok(SiteConfig::default()),
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("output_dir", &self.output_dir)?;
        validate_path("snapshot_file", &self.snapshot_file)?;
        if let Some(log_file) = &self.log_file {
            validate_non_empty_string("log_file", log_file)?;
        }
        Ok(())
    }
}
