mod commands;
mod equipment;
mod import;
mod init;
mod jobs;
mod taxonomy;

pub use commands::{EquipmentCommands, JobsCommands, TaxonomyCommands, TaxonomyLevel};
pub use equipment::{run_equipment_list, run_equipment_stats};
pub use import::{ImportOptions, run_import};
pub use init::run_init;
pub use jobs::{run_jobs_list, run_jobs_show};
pub use taxonomy::run_taxonomy_list;

use std::sync::Arc;

use serde::Serialize;

use crate::config::AppConfig;
use crate::store::{SqliteStore, Store};

/// Load config and open the store from a data directory, checking it exists
pub fn init_store(data_dir: &str) -> anyhow::Result<(AppConfig, Arc<dyn Store>)> {
    let config = AppConfig::load(data_dir)?;
    let db_path = config.db_path();

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'assetdesk init' first.",
            db_path.display()
        );
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;
    Ok((config, Arc::new(store)))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
