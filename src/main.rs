use std::path::Path;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tracing::{error, info, warn};

mod config;
mod credentials;
mod live_scores;
mod lock;
mod pipeline;
mod publish;
mod snapshot;

use config::Config;
use credentials::load_api_key;
use live_scores::{CompetitionFilter, FootballData, MatchSource};
use lock::RunLock;
use pipeline::Pipeline;
use publish::{GitCli, PublishSettings, Publisher};
use snapshot::SnapshotWriter;

const LOCK_FILE: &str = ".score-publisher.lock";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;
    let base_dir = config.resolve_base_dir()?;

    let code = run(&config, &base_dir, |api_key| {
        let source = FootballData::new(api_key, &config.api_url, config.http_timeout())?;
        Ok(Box::new(source) as Box<dyn MatchSource>)
    })
    .await;

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// One scheduled run. `connect` builds the match source from the API key.
///
/// Returns the process exit code: 1 when credentials are unavailable, 0 for
/// every other ending, including failed fetches and publishes.
async fn run<F>(config: &Config, base_dir: &Path, connect: F) -> i32
where
    F: FnOnce(String) -> Result<Box<dyn MatchSource>>,
{
    // Credentials are the only failure that reaches the scheduler.
    let api_key = match load_api_key(base_dir, &config.secrets_file) {
        Ok(key) => key,
        Err(e) => {
            error!("CRITICAL ERROR: {}", e);
            return 1;
        }
    };

    let _lock = match RunLock::acquire(&base_dir.join(LOCK_FILE)) {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            warn!("Another run is in progress, skipping this cycle");
            return 0;
        }
        Err(e) => {
            error!("Could not take run lock: {:#}", e);
            return 0;
        }
    };

    let source = match connect(api_key) {
        Ok(s) => s,
        Err(e) => {
            error!("Script Error: {:#}", e);
            return 0;
        }
    };

    let filter = CompetitionFilter::default();
    let writer = SnapshotWriter::new(base_dir.join(&config.snapshot_path));
    let publisher = Publisher::new(
        GitCli::new(base_dir, &config.bot_name, &config.bot_email),
        PublishSettings {
            remote: config.git_remote.clone(),
            branch: config.git_branch.clone(),
            update_message: config.update_message.clone(),
            initial_message: config.initial_message.clone(),
        },
    );

    if config.dry_run {
        info!("🟡 DRY RUN mode – snapshot is written but not published");
    }

    let now = Local::now().naive_local();
    info!("[{}] Fetching data...", now.format("%H:%M:%S"));

    let pipeline = Pipeline {
        source: source.as_ref(),
        filter: &filter,
        writer: &writer,
        publisher: (!config.dry_run).then_some(&publisher),
        repo_path: &config.snapshot_path,
    };
    pipeline.run_once(now).await.log();
    0
}
