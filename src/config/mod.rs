mod file_config;

pub use file_config::FileConfig;

use crate::extract::SONG_PLAY_PAGE;
use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DEFAULT_SONG_DATA_DIR: &str = "data/song_data";
pub const DEFAULT_LOG_DATA_DIR: &str = "data/log_data";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub song_data_dir: Option<PathBuf>,
    pub log_data_dir: Option<PathBuf>,
    pub song_play_page: Option<String>,
    pub fail_fast: bool,
    pub progress: bool,
    pub reset: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub song_data_dir: PathBuf,
    pub log_data_dir: PathBuf,
    pub song_play_page: String,
    /// Halt the batch on the first file that fails to load.
    pub fail_fast: bool,
    pub progress: bool,
    /// Drop and recreate the warehouse tables before loading.
    pub reset: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db or in config file")
            })?;
        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }

        let song_data_dir = file
            .song_data_dir
            .map(PathBuf::from)
            .or_else(|| cli.song_data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SONG_DATA_DIR));
        let log_data_dir = file
            .log_data_dir
            .map(PathBuf::from)
            .or_else(|| cli.log_data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DATA_DIR));

        let song_play_page = file
            .song_play_page
            .or_else(|| cli.song_play_page.clone())
            .unwrap_or_else(|| SONG_PLAY_PAGE.to_string());
        if song_play_page.trim().is_empty() {
            bail!("song_play_page must not be empty");
        }

        Ok(Self {
            db_path,
            song_data_dir,
            log_data_dir,
            song_play_page,
            fail_fast: file.fail_fast.unwrap_or(cli.fail_fast),
            progress: file.progress.unwrap_or(cli.progress),
            reset: cli.reset,
        })
    }
}
