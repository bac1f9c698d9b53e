use drive_fetch::error::Result;
use drive_fetch::{auth, Config, DriveClient, Runner, SheetsClient};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Main entry point.
///
/// # Steps
/// 1. Initializes tracing with an env-filterable INFO default
/// 2. Builds the default configuration
/// 3. Loads (and if needed refreshes) the persisted OAuth token
/// 4. Runs the fetch pipeline and reports the summary
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::default();
    info!(folder = config.folder_name, "starting submission fetch");

    if let Err(e) = run(&config).await {
        error!("run failed: {e}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(config: &Config) -> Result<()> {
    let http = reqwest::Client::new();
    let token = auth::access_token(&http, &config.token_path).await?;

    let drive = DriveClient::new(http.clone(), token.clone());
    let sheets = SheetsClient::new(http, token);

    let report = Runner::new(&drive, &sheets, config).run().await?;

    info!(
        successes = report.successes,
        to_watch = report.watch_list.len(),
        "summary"
    );
    Ok(())
}
