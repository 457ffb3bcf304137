use color_eyre::eyre::eyre;
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::endpoints::DEFAULT_API_URL;
use crate::domain::{DEFAULT_DATASET, DEFAULT_DATASETS};

/// Settings resolved from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub database_url: String,
    pub default_dataset: String,
    pub datasets: Vec<String>,
    pub log_file: PathBuf,
    pub request_timeout: Duration,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            database_url: "sqlite::memory:".to_string(),
            default_dataset: DEFAULT_DATASET.to_string(),
            datasets: DEFAULT_DATASETS.iter().map(ToString::to_string).collect(),
            log_file: PathBuf::from("climate_engine.log"),
            request_timeout: Duration::from_secs(30),
            debug: false,
        }
    }
}

/// Initializes the application configuration
pub fn init_app_config() -> color_eyre::eyre::Result<AppConfig> {
    // Load environment variables from .env file
    dotenv().ok();

    let defaults = AppConfig::default();

    let base_dir: PathBuf = env::current_dir()?;
    let db_name = env::var("DATABASE_NAME").unwrap_or_else(|_| "climate_engine.db".to_string());
    let database_url = sqlite_url(&base_dir.join(db_name))?;

    let default_dataset = env::var("DEFAULT_DATASET")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map_or(defaults.default_dataset, |value| value.trim().to_string());

    let mut datasets = env::var("DATASETS")
        .ok()
        .map(|value| parse_dataset_list(&value))
        .filter(|list| !list.is_empty())
        .unwrap_or(defaults.datasets);
    if !datasets.contains(&default_dataset) {
        datasets.insert(0, default_dataset.clone());
    }

    let request_timeout = env::var("REQUEST_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map_or(defaults.request_timeout, Duration::from_secs);

    Ok(AppConfig {
        api_url: env::var("API_URL").unwrap_or(defaults.api_url),
        database_url,
        default_dataset,
        datasets,
        log_file: env::var("LOG_FILE").map_or(defaults.log_file, PathBuf::from),
        request_timeout,
        debug: env::var("DEBUG").is_ok_and(|value| value != "0" && !value.is_empty()),
    })
}

pub fn parse_dataset_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Builds the SQLx connection string for a database file, creating its
/// parent directory. SQLx wants `sqlite:///abs/path` (three slashes) for
/// absolute paths and `sqlite://rel/path` for relative ones.
fn sqlite_url(database_path: &std::path::Path) -> color_eyre::eyre::Result<String> {
    if let Some(parent) = database_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let path_str = database_path
        .to_str()
        .ok_or_else(|| eyre!("Invalid database path"))?;
    let clean_path = path_str.trim_start_matches('/');

    if database_path.is_absolute() {
        Ok(format!("sqlite:///{clean_path}"))
    } else {
        Ok(format!("sqlite://{clean_path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dataset_list_skips_blanks() {
        assert_eq!(
            parse_dataset_list(" GRIDMET, ,ERA5_DAILY,"),
            vec!["GRIDMET".to_string(), "ERA5_DAILY".to_string()]
        );
    }

    #[test]
    fn test_sqlite_url_for_absolute_path() -> color_eyre::eyre::Result<()> {
        let dir = std::env::temp_dir();
        let url = sqlite_url(&dir.join("climate_engine_test.db"))?;
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("climate_engine_test.db"));
        Ok(())
    }
}
