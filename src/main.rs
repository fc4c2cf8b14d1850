use anyhow::Context;
use clap::{Parser, ValueEnum};
use dedup_log::DedupLogs;
use reddit_client::{
    resolve_credentials, EnvCredentials, FileCredentials, RedditClient, RedditClientConfig,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wonderbot_core::{BotConfig, Category};
use wonderbot_service::{BatchProcessor, Scheduler};

const DEFAULT_CONFIG_PATH: &str = "wonderbot.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Answer new comments once and exit
    Comments,
    /// Answer new submissions once and exit
    Submissions,
    /// Answer comments and submissions every poll interval until Ctrl-C
    Scheduled,
}

/// Replies to subreddit posts and comments that mention the keyword.
#[derive(Debug, Parser)]
#[command(name = "wonderbot", version, about)]
struct Cli {
    #[arg(value_enum)]
    mode: Mode,

    /// TOML configuration file
    #[arg(long, env = "WONDERBOT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// JSON login file; REDDIT_* environment variables are used when absent
    #[arg(long, env = "WONDERBOT_CREDENTIALS", default_value = "login_info.json")]
    credentials: PathBuf,

    /// Overrides the configured subreddit
    #[arg(long)]
    subreddit: Option<String>,
}

fn load_config(cli: &Cli) -> anyhow::Result<BotConfig> {
    let mut config = if cli.config.as_os_str() == DEFAULT_CONFIG_PATH {
        BotConfig::load_or_default(&cli.config)
    } else {
        BotConfig::load(&cli.config)
    }
    .with_context(|| format!("Could not load configuration from {}", cli.config.display()))?;

    if let Some(subreddit) = &cli.subreddit {
        config.subreddit = subreddit.clone();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("wonderbot=info,wonderbot_service=info,reddit_client=info")
            }),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("Starting wonderbot v{} in {:?} mode", env!("CARGO_PKG_VERSION"), cli.mode);

    let config = load_config(&cli)?;

    let file_credentials = FileCredentials::new(&cli.credentials);
    let env_credentials = EnvCredentials::new();
    let credentials = resolve_credentials(&[&file_credentials, &env_credentials])
        .context("Could not load Reddit credentials")?;

    let client_config = RedditClientConfig::from_bot_config(&config)?;
    let client = RedditClient::new(client_config, credentials)?;
    let logs = DedupLogs::open(&config.log_dir)
        .with_context(|| format!("Could not prepare log directory {}", config.log_dir.display()))?;

    tracing::info!(
        "Watching r/{} for '{}' as u/{}",
        config.subreddit,
        config.keyword,
        config.bot_account
    );

    let interval = config.poll_interval();
    let processor = BatchProcessor::new(client, config, logs);

    match cli.mode {
        Mode::Comments => {
            let summary = processor.process_category(Category::Comment).await?;
            tracing::info!("{}", summary);
        }
        Mode::Submissions => {
            let summary = processor.process_category(Category::Submission).await?;
            tracing::info!("{}", summary);
        }
        Mode::Scheduled => {
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Could not listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            };
            Scheduler::new(interval).run(&processor, shutdown).await?;
        }
    }

    Ok(())
}
