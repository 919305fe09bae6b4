use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the shared object files.
    pub path: String,
    /// Used by `read` when no timeout is passed; negative waits forever.
    pub default_timeout_ms: i64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    pub stdout_level: String,
    pub file_level: String,
}

pub fn load_settings() -> Result<Settings, config::ConfigError> {
    let config_path = env::var("SHM_TABLES_CONFIG").unwrap_or_else(|_| "config".to_string());

    let settings: Settings = config::Config::builder()
        .set_default("store.path", default_store_path())?
        .set_default("store.default_timeout_ms", 0)?
        .set_default("store.poll_interval_ms", 5)?
        .set_default("logging.log_dir", "logs")?
        .set_default("logging.stdout_level", "info")?
        .set_default("logging.file_level", "debug")?
        .add_source(config::File::with_name(&config_path).required(false))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}

fn default_store_path() -> String {
    env::temp_dir()
        .join("shm_tables")
        .to_string_lossy()
        .into_owned()
}
