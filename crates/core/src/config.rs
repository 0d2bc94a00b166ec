//! Configuration management for Strata.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config files (.strata/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric: relative directories and the
//! database path are resolved against the workspace root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .strata/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Directory scanned for new input files
    pub raw_dir: PathBuf,

    /// Destination for successfully processed inputs
    pub processed_dir: PathBuf,

    /// Destination for quarantined inputs
    pub error_dir: PathBuf,

    /// SQLite document store holding schema versions and processed records
    pub database: PathBuf,

    /// Upper bound for one document's store round-trips, in seconds
    pub store_timeout_secs: u64,

    /// Move inputs that no reader could parse into the error directory
    pub quarantine_unparseable: bool,

    /// Log level override
    pub log_level: Option<String>,

    /// Log line format on stderr
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    pipeline: Option<PipelineConfig>,
    store: Option<StoreConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineConfig {
    raw_dir: Option<String>,
    processed_dir: Option<String>,
    error_dir: Option<String>,
    store_timeout_secs: Option<u64>,
    quarantine_unparseable: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    format: Option<LogFormat>,
    color: Option<bool>,
}

const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            error_dir: PathBuf::from("data/error"),
            database: PathBuf::from(".strata/strata.sqlite"),
            store_timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
            quarantine_unparseable: false,
            log_level: None,
            log_format: LogFormat::Text,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and environment variables.
    ///
    /// Environment variables:
    /// - `STRATA_WORKSPACE`: Override workspace path
    /// - `STRATA_CONFIG`: Path to config file
    /// - `STRATA_RAW_DIR`: Raw input directory
    /// - `STRATA_DB`: SQLite database path
    /// - `RUST_LOG`: Log level
    /// - `STRATA_LOG_FORMAT`: `text` or `json`
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use strata_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Raw dir: {:?}", config.raw_path());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`AppConfig::load`], with an explicit workspace and config file
    /// taking precedence over `STRATA_WORKSPACE` / `STRATA_CONFIG` when
    /// locating the YAML file.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("STRATA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        if let Ok(config_file) = std::env::var("STRATA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }
        if let Some(config_file) = config_file {
            config.config_file = Some(config_file);
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.strata_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(raw_dir) = std::env::var("STRATA_RAW_DIR") {
            config.raw_dir = PathBuf::from(raw_dir);
        }

        if let Ok(db) = std::env::var("STRATA_DB") {
            config.database = PathBuf::from(db);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if let Ok(format) = std::env::var("STRATA_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        Ok(self.clone().apply_file(config_file))
    }

    fn apply_file(mut self, config_file: ConfigFile) -> Self {
        if let Some(pipeline) = config_file.pipeline {
            if let Some(raw_dir) = pipeline.raw_dir {
                self.raw_dir = PathBuf::from(raw_dir);
            }
            if let Some(processed_dir) = pipeline.processed_dir {
                self.processed_dir = PathBuf::from(processed_dir);
            }
            if let Some(error_dir) = pipeline.error_dir {
                self.error_dir = PathBuf::from(error_dir);
            }
            if let Some(timeout) = pipeline.store_timeout_secs {
                self.store_timeout_secs = timeout;
            }
            if let Some(quarantine) = pipeline.quarantine_unparseable {
                self.quarantine_unparseable = quarantine;
            }
        }

        if let Some(store) = config_file.store {
            if let Some(path) = store.path {
                self.database = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(format) = logging.format {
                self.log_format = format;
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        self
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        log_format: Option<LogFormat>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if let Some(log_format) = log_format {
            self.log_format = log_format;
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .strata directory.
    pub fn strata_dir(&self) -> PathBuf {
        self.workspace.join(".strata")
    }

    /// Ensure the .strata directory exists.
    pub fn ensure_strata_dir(&self) -> AppResult<()> {
        let strata_dir = self.strata_dir();
        if !strata_dir.exists() {
            std::fs::create_dir_all(&strata_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .strata directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Raw input directory, resolved against the workspace.
    pub fn raw_path(&self) -> PathBuf {
        self.resolve(&self.raw_dir)
    }

    /// Processed directory, resolved against the workspace.
    pub fn processed_path(&self) -> PathBuf {
        self.resolve(&self.processed_dir)
    }

    /// Error directory, resolved against the workspace.
    pub fn error_path(&self) -> PathBuf {
        self.resolve(&self.error_dir)
    }

    /// SQLite database path, resolved against the workspace.
    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.database)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Validate the directory layout and limits.
    pub fn validate(&self) -> AppResult<()> {
        if self.store_timeout_secs == 0 {
            return Err(AppError::Config(
                "storeTimeoutSecs must be greater than zero".to_string(),
            ));
        }

        let raw = self.raw_path();
        if raw == self.processed_path() || raw == self.error_path() {
            return Err(AppError::Config(format!(
                "Raw directory {:?} must differ from the processed and error directories",
                raw
            )));
        }

        Ok(())
    }
}
