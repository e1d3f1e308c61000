mod app;

pub use app::{AppConfig, CONFIG_FILE_NAME};
