use crate::domain::model::RegionId;
use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Site layout and timing. Every section falls back to the values for the
/// public outage map, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub site: SiteUrls,
    pub selectors: Selectors,
    pub timing: Timing,
    pub screenshot: ScreenshotConfig,
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteUrls {
    pub root_url: String,
    /// Relative to `root_url`; `{region}` is replaced by the region token.
    pub region_path: String,
    /// Relative to `root_url`; `{sub_region}` is replaced by the lowercase name.
    pub sub_region_path: String,
}

impl Default for SiteUrls {
    fn default() -> Self {
        Self {
            root_url: "https://avbrottskarta.ellevio.se/".to_string(),
            region_path: "län/{region}/idag".to_string(),
            sub_region_path: "kommun/{sub_region}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub location_table: String,
    pub row: String,
    pub cell: String,
    pub consent_button: String,
    pub timestamps_container: String,
    pub timestamps_block: String,
    pub timestamps_line: String,
    pub info_text: String,
    pub last_updated: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            location_table: ".InfoBox_locationList__1AKS1".to_string(),
            row: "tr".to_string(),
            cell: "td".to_string(),
            consent_button: "#CybotCookiebotDialogBodyLevelButtonLevelOptinAllowAll".to_string(),
            timestamps_container: ".InterruptInfo_timestampsContainer__3f5L_".to_string(),
            timestamps_block: "div".to_string(),
            timestamps_line: "div".to_string(),
            info_text: ".InterruptInfo_customerInformationText__2hO59".to_string(),
            last_updated: ".InfoBox_lastUpdatedText__1-6ip".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub navigation_timeout_secs: u64,
    pub element_wait_secs: u64,
    pub consent_wait_secs: u64,
    pub listing_settle_ms: u64,
    pub detail_settle_ms: u64,
    pub consent_settle_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: 30,
            element_wait_secs: 10,
            consent_wait_secs: 2,
            listing_settle_ms: 1000,
            detail_settle_ms: 2000,
            consent_settle_ms: 1000,
        }
    }
}

impl Timing {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn element_wait(&self) -> Duration {
        Duration::from_secs(self.element_wait_secs)
    }

    pub fn consent_wait(&self) -> Duration {
        Duration::from_secs(self.consent_wait_secs)
    }

    pub fn listing_settle(&self) -> Duration {
        Duration::from_millis(self.listing_settle_ms)
    }

    pub fn detail_settle(&self) -> Duration {
        Duration::from_millis(self.detail_settle_ms)
    }

    pub fn consent_settle(&self) -> Duration {
        Duration::from_millis(self.consent_settle_ms)
    }

    /// No settle delays, short waits. Used by tests driving an in-memory page.
    pub fn immediate() -> Self {
        Self {
            navigation_timeout_secs: 1,
            element_wait_secs: 0,
            consent_wait_secs: 0,
            listing_settle_ms: 0,
            detail_settle_ms: 0,
            consent_settle_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotConfig {
    pub enabled: bool,
    /// Relative to the output directory; empty means the output directory itself.
    pub directory: String,
    pub left: u32,
    pub top: u32,
    pub right_margin: u32,
    pub bottom_margin: u32,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: String::new(),
            left: 370,
            top: 40,
            right_margin: 100,
            bottom_margin: 200,
        }
    }
}

impl ScreenshotConfig {
    pub fn file_name(&self, sub_region: &str) -> String {
        if self.directory.is_empty() {
            format!("{}.png", sub_region)
        } else {
            format!("{}/{}.png", self.directory.trim_end_matches('/'), sub_region)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

impl SiteConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ScrapeError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScrapeError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn root_url(&self) -> Result<Url> {
        Url::parse(&self.site.root_url).map_err(|e| ScrapeError::InvalidConfigValueError {
            field: "site.root_url".to_string(),
            value: self.site.root_url.clone(),
            reason: e.to_string(),
        })
    }

    pub fn region_url(&self, region: &RegionId) -> Result<Url> {
        let path = self.site.region_path.replace("{region}", region.as_str());
        self.join(&path)
    }

    pub fn sub_region_url(&self, sub_region: &str) -> Result<Url> {
        let path = self.site.sub_region_path.replace("{sub_region}", sub_region);
        self.join(&path)
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.root_url()?
            .join(path)
            .map_err(|e| ScrapeError::ConfigError {
                message: format!("cannot build page URL from '{}': {}", path, e),
            })
    }
}

impl Validate for SiteConfig {
    fn validate(&self) -> Result<()> {
        validate_url("site.root_url", &self.site.root_url)?;
        validate_non_empty_string("site.region_path", &self.site.region_path)?;
        validate_non_empty_string("site.sub_region_path", &self.site.sub_region_path)?;

        let selectors = [
            ("selectors.location_table", &self.selectors.location_table),
            ("selectors.row", &self.selectors.row),
            ("selectors.cell", &self.selectors.cell),
            ("selectors.consent_button", &self.selectors.consent_button),
            ("selectors.timestamps_container", &self.selectors.timestamps_container),
            ("selectors.timestamps_block", &self.selectors.timestamps_block),
            ("selectors.timestamps_line", &self.selectors.timestamps_line),
            ("selectors.info_text", &self.selectors.info_text),
            ("selectors.last_updated", &self.selectors.last_updated),
        ];
        for (field, value) in selectors {
            validate_non_empty_string(field, value)?;
        }

        validate_positive_number(
            "timing.navigation_timeout_secs",
            self.timing.navigation_timeout_secs,
            1,
        )?;
        validate_positive_number("timing.element_wait_secs", self.timing.element_wait_secs, 1)?;

        validate_range("browser.window_width", self.browser.window_width, 640, 7680)?;
        validate_range("browser.window_height", self.browser.window_height, 480, 4320)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::normalize;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_toml_uses_site_defaults() {
        let config = SiteConfig::from_toml_str("").unwrap();

        assert_eq!(config.site.root_url, "https://avbrottskarta.ellevio.se/");
        assert_eq!(config.selectors.location_table, ".InfoBox_locationList__1AKS1");
        assert_eq!(config.timing.detail_settle_ms, 2000);
        assert_eq!(config.screenshot.left, 370);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_section_override() {
        let toml_content = r#"
[timing]
element_wait_secs = 3

[screenshot]
enabled = false
directory = "shots"
"#;

        let config = SiteConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.timing.element_wait_secs, 3);
        assert_eq!(config.timing.navigation_timeout_secs, 30);
        assert!(!config.screenshot.enabled);
        assert_eq!(config.screenshot.file_name("solna"), "shots/solna.png");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("OUTAGE_SCRAPER_TEST_ROOT", "https://outages.example.com/");

        let toml_content = r#"
[site]
root_url = "${OUTAGE_SCRAPER_TEST_ROOT}"
"#;

        let config = SiteConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.site.root_url, "https://outages.example.com/");

        std::env::remove_var("OUTAGE_SCRAPER_TEST_ROOT");
    }

    #[test]
    fn test_invalid_root_url_fails_validation() {
        let toml_content = r#"
[site]
root_url = "not a url"
"#;

        let config = SiteConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_page_urls() {
        let config = SiteConfig::default();

        let region = config.region_url(&normalize("Stockholms län")).unwrap();
        assert_eq!(
            region.as_str(),
            "https://avbrottskarta.ellevio.se/l%C3%A4n/stockholm/idag"
        );

        let sub_region = config.sub_region_url("täby").unwrap();
        assert_eq!(
            sub_region.as_str(),
            "https://avbrottskarta.ellevio.se/kommun/t%C3%A4by"
        );
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[browser]\nwindow_width = 1280\nwindow_height = 720\n")
            .unwrap();

        let config = SiteConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.browser.window_width, 1280);
        assert!(config.browser.headless);
    }
}
