use anyhow::Result;
use clap::Parser;
use playlog_etl::config::{AppConfig, CliConfig, FileConfig};
use playlog_etl::transform::JoinMode;
use playlog_etl::{run, EtlContext, RunSummary};
use std::path::PathBuf;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "playlog-etl", version)]
struct CliArgs {
    /// Path to a TOML config file. Its values override the CLI flags.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Location of the raw datasets (local path or file:// URI).
    #[clap(long, default_value = "data")]
    pub input: String,

    /// Location the output tables are written to.
    #[clap(long, default_value = "output")]
    pub output: String,

    /// Time zone for the time breakdown: UTC or a fixed offset like +05:30.
    #[clap(long, default_value = "UTC")]
    pub timezone: String,

    /// What to do with plays that match no catalog song.
    #[clap(long, value_enum, default_value_t = JoinMode::LeftOuter)]
    pub join_mode: JoinMode,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            input_path: args.input.clone(),
            output_path: args.output.clone(),
            timezone: args.timezone.clone(),
            join_mode: args.join_mode,
        }
    }
}

fn log_summary(summary: &RunSummary) {
    info!("Run Summary");
    info!("===========");
    info!("Song records read: {}", summary.catalog.records_read);
    info!("Songs written: {}", summary.catalog.songs);
    info!("Artists written: {}", summary.catalog.artists);
    info!("Log records read: {}", summary.activity.records_read);
    info!("Song plays: {}", summary.activity.song_plays);
    info!("Users written: {}", summary.activity.users);
    info!("Time entries written: {}", summary.activity.time_entries);
    info!("Songplays written: {}", summary.activity.songplays);
    if summary.activity.unmatched_plays > 0 {
        info!(
            "Plays without a catalog match: {}",
            summary.activity.unmatched_plays
        );
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    info!(
        "playlog-etl {}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: CliConfig = (&cli_args).into();
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  input: {}", app_config.input_path);
    info!("  output: {}", app_config.output_path);
    info!("  timezone: {}", app_config.timezone);
    info!("  join_mode: {}", app_config.join_mode);

    let outcome = EtlContext::from_config(&app_config).and_then(|ctx| run(&ctx));
    match outcome {
        Ok(summary) => {
            log_summary(&summary);
            Ok(())
        }
        Err(e) => {
            error!("Run failed ({}): {}", e.kind(), e);
            Err(e.into())
        }
    }
}
