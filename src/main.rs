//! Command line entry point. Takes no arguments; see `ConfigManager` for the
//! optional configuration file.

use std::sync::Arc;
use tracing::{info, warn};

use timacad_crawler_lib::application::Scheduler;
use timacad_crawler_lib::infrastructure::{
    ConfigManager, HttpClient, HttpClientConfig, init_logging_with_config, log_system_info,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_manager = ConfigManager::new()?;
    let (config, config_source) = config_manager.load_config().await;

    // A broken logging setup must not prevent the crawl
    if let Err(e) = init_logging_with_config(&config.logging) {
        eprintln!("Failed to initialize logging: {e:#}");
    }
    log_system_info();
    config_source.report(config_manager.config_path());

    let client = HttpClient::with_config(HttpClientConfig::from_http_config(&config.http))?;
    info!(
        "HTTP client: timeout {}s, user agent '{}'",
        client.config().timeout_seconds,
        client.config().user_agent
    );
    let scheduler = Scheduler::new(&config, Arc::new(client));

    let cancellation = scheduler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Interrupt received, cancelling outstanding fetches");
            cancellation.cancel();
        }
    });

    // Per-competition failures are part of the summary; only setup errors end the process with an error
    let summary = scheduler.run().await?;
    summary.log_scoreboard();
    if let Some(dir) = &summary.session_dir {
        info!("📁 Output: {:?}", dir);
    }

    Ok(())
}
