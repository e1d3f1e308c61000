use std::fs;
use std::path::PathBuf;

use crate::config::{AppConfig, CONFIG_FILE_NAME};
use crate::store::{SqliteStore, Store};

pub fn run_init(data_dir: String) -> anyhow::Result<()> {
    let data_path: PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;

    let wrote_config = AppConfig::write_default(&data_path)?;
    let config = AppConfig::load(&data_path)?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    tracing::info!("Initialized database at {}", config.db_path().display());

    println!("Database: {}", config.db_path().display());
    if wrote_config {
        println!("Config:   {}", data_path.join(CONFIG_FILE_NAME).display());
    } else {
        println!(
            "Config:   {} (existing, left unchanged)",
            data_path.join(CONFIG_FILE_NAME).display()
        );
    }

    Ok(())
}
