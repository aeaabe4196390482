use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wedding_party_server::config::{AppConfig, CliConfig, FileConfig};
use wedding_party_server::music_requests::MAX_MUSIC_REQUESTS_PER_USER;
use wedding_party_server::user::{SqliteUserStore, UserAuthTokenStore};
use wedding_party_server::{open_database, run_server, RequestsLoggingLevel};

const TOKEN_PRUNE_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite party database file, created if missing.
    #[clap(value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Path to a TOML config file, its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// How many artists, albums and songs each user can request, per kind.
    #[clap(long, default_value_t = MAX_MUSIC_REQUESTS_PER_USER)]
    pub max_music_requests_per_user: usize,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Auth tokens unused for this many days are deleted. Set to 0 to disable pruning.
    #[clap(long, default_value_t = 30)]
    pub token_max_unused_days: u64,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            frontend_dir_path: self.frontend_dir_path.clone(),
            max_music_requests_per_user: self.max_music_requests_per_user,
            token_max_unused_days: self.token_max_unused_days,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Opening party database at {:?}...", app_config.db_path);
    let conn = open_database(&app_config.db_path)?;

    if app_config.token_max_unused_days > 0 {
        let unused_days = app_config.token_max_unused_days;
        let pruning_user_store = SqliteUserStore::new(conn.clone());
        info!(
            "Auth token pruning enabled: deleting tokens unused for {} days",
            unused_days
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TOKEN_PRUNE_INTERVAL);
            loop {
                ticker.tick().await;
                match pruning_user_store.prune_unused_auth_tokens(unused_days) {
                    Ok(count) => {
                        if count > 0 {
                            info!("Pruned {} unused auth tokens", count);
                        }
                    }
                    Err(e) => {
                        error!("Failed to prune auth tokens: {}", e);
                    }
                }
            }
        });
    }

    info!(
        "Ready to serve at port {}, {} music requests per kind and user",
        app_config.port, app_config.max_music_requests_per_user
    );
    run_server(
        app_config.server_config(),
        conn,
        app_config.max_music_requests_per_user,
    )
    .await
}
