use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub db_path: Option<String>,
    pub song_data_dir: Option<String>,
    pub log_data_dir: Option<String>,
    /// `page` value of the events to load from log files.
    pub song_play_page: Option<String>,
    pub fail_fast: Option<bool>,
    pub progress: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("etl.toml");
        std::fs::write(
            &path,
            "db_path = \"/var/lib/sparkify/warehouse.db\"\nfail_fast = true\n",
        )
        .unwrap();

        let config = FileConfig::load(&path).unwrap();

        assert_eq!(
            config.db_path.as_deref(),
            Some("/var/lib/sparkify/warehouse.db")
        );
        assert_eq!(config.fail_fast, Some(true));
        assert!(config.song_data_dir.is_none());
        assert!(config.progress.is_none());
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("etl.toml");
        std::fs::write(&path, "db_pth = \"typo.db\"\n").unwrap();

        let err = FileConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("db_pth"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = FileConfig::load(Path::new("/nonexistent/etl.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
