use anyhow::Context;
use clap::Parser;
use outage_scraper::core::shutdown::Shutdown;
use outage_scraper::utils::{logger, validation::Validate};
use outage_scraper::{
    ChromiumSession, CliConfig, HierarchicalCrawler, LocalStorage, ScraperLoop, SnapshotWriter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    let log_path = config.log_path();
    let log_guard = logger::init_cli_logger(config.verbose, log_path.as_deref(), config.json_logs)
        .context("failed to open log file")?;

    tracing::info!("Starting outage-scraper");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        drop(log_guard);
        std::process::exit(1);
    }

    let site = config.site_config().context("failed to load site configuration")?;
    if let Err(e) = site.validate() {
        tracing::error!("❌ Site configuration is invalid: {}", e);
        eprintln!("❌ {}", e);
        drop(log_guard);
        std::process::exit(1);
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let session = ChromiumSession::launch(&site.browser)
        .await
        .context("could not start the browser session")?;

    let storage = LocalStorage::new(&config.output_dir);
    let crawler = HierarchicalCrawler::new(session, site, storage.clone());
    let writer = SnapshotWriter::new(storage, config.snapshot_file.clone());
    let scraper = ScraperLoop::new_with_monitoring(crawler, writer, config.monitor);

    let (trigger, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested, finishing current step");
            trigger.trigger();
        }
    });

    if config.once {
        scraper.run_cycle(&shutdown).await;
    } else {
        scraper.run(config.interval, shutdown).await;
    }

    let mut session = scraper.into_crawler().into_session();
    session.close().await;
    tracing::info!("outage-scraper stopped");
    drop(log_guard);

    Ok(())
}
