use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "assetdesk.toml";

const DEFAULT_MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Number of import workers pulling from the job queue.
    pub workers: usize,
    /// Upper bound on the decoded size of a single import file.
    pub max_import_bytes: usize,
    pub default_page_size: u32,
}

impl AppConfig {
    /// Loads `<data_dir>/assetdesk.toml` when present, defaults otherwise.
    /// The data directory always comes from the caller, not the file.
    pub fn load<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let path = data_dir.join(CONFIG_FILE_NAME);

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str::<AppConfig>(&content)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?
        } else {
            AppConfig::default()
        };

        config.data_dir = data_dir;
        config.validate()?;
        Ok(config)
    }

    /// Writes the default config file unless one already exists.
    pub fn write_default<P: AsRef<Path>>(data_dir: P) -> Result<bool> {
        let path = data_dir.as_ref().join(CONFIG_FILE_NAME);
        if path.exists() {
            return Ok(false);
        }

        let defaults = AppConfig::default();
        let content = format!(
            "workers = {}\nmax_import_bytes = {}\ndefault_page_size = {}\n",
            defaults.workers, defaults.max_import_bytes, defaults.default_page_size
        );
        fs::write(&path, content)?;
        Ok(true)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Config("workers must be at least 1".to_string()));
        }
        if self.max_import_bytes == 0 {
            return Err(Error::Config(
                "max_import_bytes must be greater than 0".to_string(),
            ));
        }
        if self.default_page_size == 0 {
            return Err(Error::Config(
                "default_page_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("assetdesk.db")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            workers: 2,
            max_import_bytes: DEFAULT_MAX_IMPORT_BYTES,
            default_page_size: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_without_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load(temp.path()).unwrap();

        assert_eq!(config.workers, 2);
        assert_eq!(config.max_import_bytes, 10 * 1024 * 1024);
        assert_eq!(config.db_path(), temp.path().join("assetdesk.db"));
    }

    #[test]
    fn test_load_reads_overrides() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "workers = 4\nmax_import_bytes = 2048\n",
        )
        .unwrap();

        let config = AppConfig::load(temp.path()).unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.max_import_bytes, 2048);
        assert_eq!(config.default_page_size, 10);
    }

    #[test]
    fn test_load_rejects_unknown_keys_and_zero_workers() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);

        fs::write(&path, "worker_count = 3\n").unwrap();
        assert!(matches!(AppConfig::load(temp.path()), Err(Error::Config(_))));

        fs::write(&path, "workers = 0\n").unwrap();
        assert!(matches!(AppConfig::load(temp.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_write_default_does_not_overwrite() {
        let temp = TempDir::new().unwrap();
        assert!(AppConfig::write_default(temp.path()).unwrap());

        fs::write(temp.path().join(CONFIG_FILE_NAME), "workers = 7\n").unwrap();
        assert!(!AppConfig::write_default(temp.path()).unwrap());

        let config = AppConfig::load(temp.path()).unwrap();
        assert_eq!(config.workers, 7);
    }
}
