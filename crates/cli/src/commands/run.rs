use anyhow::{Context, Result};
use preview_sweep_core::Config;
use preview_sweep_sweeper::{Cleanup, CloudflareClient, GithubClient};
use std::path::PathBuf;
use std::time::Duration;

pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub dry_run: bool,
    pub max_pages: Option<u32>,
    pub timeout_secs: Option<u64>,
}

/// Tear down the preview environment and deployments for the configured ref
pub async fn run(options: RunOptions) -> Result<()> {
    let config = load_config(&options)?;
    tracing::debug!(?config, "Loaded configuration");

    let timeout = options.timeout_secs.map(Duration::from_secs);
    let github =
        GithubClient::new(&config.github, timeout).context("Failed to create GitHub client")?;
    let cloudflare = CloudflareClient::new(&config.cloudflare, timeout)
        .context("Failed to create Cloudflare client")?;

    Cleanup::new(&config, &github, &cloudflare)
        .dry_run(options.dry_run)
        .run()
        .await
        .context("Cleanup aborted")?;

    Ok(())
}

/// Resolve configuration before any client exists, so a bad environment
/// fails without touching the network
fn load_config(options: &RunOptions) -> Result<Config> {
    let config = Config::load(options.config.as_deref()).context("Failed to load configuration")?;

    match options.max_pages {
        Some(max_pages) => Ok(config.with_max_pages(max_pages)?),
        None => Ok(config),
    }
}
