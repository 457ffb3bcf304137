use clap::{CommandFactory, Parser};

#[derive(Debug, Parser)]
#[command(name = "climate-engine", version, about = "Climate Engine explorer")]
pub struct CliArgs {
    /// Print dataset metadata (and optionally a point time series) and exit
    #[arg(long)]
    pub headless: bool,

    /// Print headless output as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Override database path
    #[arg(long, value_name = "PATH")]
    pub db: Option<String>,

    /// Override the climate data API base URL
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,

    /// Override the log file path
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<String>,

    /// Dataset to load first (and to query in headless mode)
    #[arg(long, value_name = "ID")]
    pub dataset: Option<String>,

    /// API key for headless mode; falls back to CLIMATE_ENGINE_API_KEY and
    /// then the stored key
    #[arg(long = "api-key", value_name = "KEY", env = "CLIMATE_ENGINE_API_KEY")]
    pub api_key: Option<String>,

    /// Variable for the headless time series (defaults to the first one)
    #[arg(long, value_name = "ID")]
    pub variable: Option<String>,

    /// Latitude of the headless time series point
    #[arg(long, allow_negative_numbers = true, requires = "lng")]
    pub lat: Option<f64>,

    /// Longitude of the headless time series point
    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    pub lng: Option<f64>,

    /// Start date (YYYY-MM-DD) of the headless time series
    #[arg(long, value_name = "DATE")]
    pub start: Option<String>,

    /// End date (YYYY-MM-DD) of the headless time series
    #[arg(long, value_name = "DATE")]
    pub end: Option<String>,
}

impl CliArgs {
    pub fn apply_env_overrides(&self) {
        if let Some(db) = &self.db {
            std::env::set_var("DATABASE_NAME", db);
        }
        if let Some(url) = &self.api_url {
            std::env::set_var("API_URL", url);
        }
        if let Some(path) = &self.log_file {
            std::env::set_var("LOG_FILE", path);
        }
        if let Some(dataset) = &self.dataset {
            std::env::set_var("DEFAULT_DATASET", dataset);
        }
        if self.debug {
            std::env::set_var("DEBUG", "1");
        }
    }

    pub fn help_text() -> String {
        let mut command = Self::command();
        let mut buffer = Vec::new();
        command.write_help(&mut buffer).ok();
        String::from_utf8_lossy(&buffer).to_string()
    }
}
