//! # Assetdesk
//!
//! Equipment back office core: a four-level equipment taxonomy
//! (industry, asset class, make, model), an equipment registry and a bulk
//! CSV import pipeline fed by an in-process job queue. Usable both as a
//! standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! assetdesk = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use assetdesk::config::AppConfig;
//! use assetdesk::import::ImportRequest;
//! use assetdesk::jobs::ImportQueue;
//! use assetdesk::store::{SqliteStore, Store};
//!
//! let config = AppConfig::load("./data")?;
//! let store = SqliteStore::new(config.db_path())?;
//! store.initialize()?;
//!
//! let queue = ImportQueue::start(Arc::new(store), &config);
//! let job = queue.submit(ImportRequest::from_bytes("assets.csv", &csv_bytes, "user-1"))?;
//! let job = queue.wait(&job.id).await?;
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod equipment;
pub mod error;
pub mod import;
pub mod jobs;
pub mod store;
pub mod taxonomy;
pub mod types;
