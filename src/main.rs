use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use songplay_etl::batch::{run_batch, BatchOptions, PassReport};
use songplay_etl::config;
use songplay_etl::warehouse::Warehouse;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "songplay-etl")]
#[command(about = "Load song metadata and activity logs into the songplay warehouse")]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite warehouse database, created if missing.
    /// Can also be specified in config file.
    #[clap(long = "db", value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Root directory of the song metadata files [default: data/song_data]
    #[clap(long = "song-data", value_parser = parse_path)]
    pub song_data_dir: Option<PathBuf>,

    /// Root directory of the activity log files [default: data/log_data]
    #[clap(long = "log-data", value_parser = parse_path)]
    pub log_data_dir: Option<PathBuf>,

    /// `page` value marking a song-play event in the logs [default: NextSong]
    #[clap(long)]
    pub song_play_page: Option<String>,

    /// Stop at the first file that fails to load.
    #[clap(long, default_value_t = false)]
    pub fail_fast: bool,

    /// Show a progress bar instead of per-file log lines.
    #[clap(long, default_value_t = false)]
    pub progress: bool,

    /// Drop and recreate the warehouse tables before loading.
    #[clap(long, default_value_t = false)]
    pub reset: bool,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_path: args.db_path.clone(),
            song_data_dir: args.song_data_dir.clone(),
            log_data_dir: args.log_data_dir.clone(),
            song_play_page: args.song_play_page.clone(),
            fail_fast: args.fail_fast,
            progress: args.progress,
            reset: args.reset,
        }
    }
}

fn log_pass(report: &PassReport) {
    info!(
        "{} pass over {}: {}/{} files loaded, {} failed, {} rows written",
        report.kind,
        report.root.display(),
        report.processed,
        report.discovered,
        report.failed.len(),
        report.rows_written
    );
    if report.plays_matched + report.plays_unmatched > 0 {
        info!(
            "  {} plays matched a song, {} unmatched",
            report.plays_matched, report.plays_unmatched
        );
    }
    for failure in &report.failed {
        warn!("  failed: {} ({})", failure.path.display(), failure.reason);
    }
    if report.skipped() > 0 {
        warn!("  {} files not attempted", report.skipped());
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
        .try_init()
        .context("Failed to initialize logging")?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_path: {:?}", app_config.db_path);
    info!("  song_data_dir: {:?}", app_config.song_data_dir);
    info!("  log_data_dir: {:?}", app_config.log_data_dir);
    info!("  song_play_page: {}", app_config.song_play_page);

    if !app_config.db_path.exists() {
        info!("Creating new warehouse database at {:?}", app_config.db_path);
    }
    let mut warehouse = if app_config.reset {
        Warehouse::open_and_reset(&app_config.db_path)?
    } else {
        Warehouse::open(&app_config.db_path)?
    };

    let options = BatchOptions {
        song_play_page: app_config.song_play_page.clone(),
        fail_fast: app_config.fail_fast,
        progress: app_config.progress,
    };
    let report = match run_batch(
        &mut warehouse,
        &app_config.song_data_dir,
        &app_config.log_data_dir,
        &options,
    ) {
        Ok(report) => report,
        Err(aborted) => {
            log_pass(&aborted.report);
            return Err(aborted).context("Batch aborted");
        }
    };

    log_pass(&report.songs);
    log_pass(&report.logs);

    let counts = warehouse.counts()?;
    info!("Warehouse contains:");
    info!("  {} songs", counts.songs);
    info!("  {} artists", counts.artists);
    info!("  {} time rows", counts.time);
    info!("  {} users", counts.users);
    info!("  {} songplays", counts.songplays);

    if report.halted {
        error!("Batch halted on the first failed file");
    }
    if !report.is_success() {
        bail!("{} file(s) failed to load", report.failed_files());
    }
    info!("Load completed successfully!");
    Ok(())
}
