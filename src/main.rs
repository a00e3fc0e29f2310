mod cli;

use std::path::Path;

use clap::Parser;
use cli::Cli;
use collector::Collector;
use reddit_client::RedditClient;
use subweave_core::{ConfigError, CoreError, ErrorReporter, RedditCredentials};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("subweave=info,subweave_core=info,reddit_client=info,collector=info")
        }))
        .init();

    info!("Starting Subweave - Reddit multi-community collector");

    if let Err(error) = run().await {
        ErrorReporter::new().report_error(&error);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CoreError> {
    let cli = Cli::parse();
    load_env_file(cli.env_file.as_deref())?;

    let credentials = RedditCredentials::from_env()?;
    let plan = cli.into_plan()?;

    let client = RedditClient::new(&credentials)?;
    let mut collector = Collector::new(client, plan)?;
    let summary = collector.run().await?;

    println!("{}", summary);

    match collector.client().export_metrics().await {
        Ok(report) => info!("Reddit API metrics:\n{}", report),
        Err(error) => warn!("Could not export API metrics: {}", error),
    }

    Ok(())
}

fn load_env_file(path: Option<&Path>) -> Result<(), CoreError> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|error| match error {
                dotenvy::Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                    CoreError::Config(ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    })
                }
                other => CoreError::Config(ConfigError::ValidationFailed {
                    reason: format!("could not load {}: {}", path.display(), other),
                }),
            })?;
            info!("Loaded environment from {}", path.display());
        }
        None => {
            // A missing default .env is fine; an explicitly named file is not.
            let _ = dotenvy::dotenv();
        }
    }
    Ok(())
}
