use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub directory: DirectoryConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub dataset_path: String,
    pub parser: String, // "rfc4180" or "naive"
    pub numeric_default: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_directory: String,
    pub share_delay_ms: u64,
    pub excluded_share_targets: Vec<String>,
}

impl ExportConfig {
    /// Pause between dismissing the export prompt and writing the file
    #[must_use]
    pub const fn share_delay(&self) -> Duration {
        Duration::from_millis(self.share_delay_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                path: ".doorknock_store".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            directory: DirectoryConfig {
                dataset_path: "data/properties.csv".to_string(),
                parser: "rfc4180".to_string(),
                numeric_default: 0,
            },
            export: ExportConfig {
                output_directory: "./output".to_string(),
                share_delay_ms: 500,
                excluded_share_targets: vec![
                    "post_to_facebook".to_string(),
                    "post_to_twitter".to_string(),
                    "post_to_weibo".to_string(),
                    "post_to_tencent_weibo".to_string(),
                    "post_to_flickr".to_string(),
                    "post_to_vimeo".to_string(),
                ],
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            // Start with default values
            .add_source(Config::try_from(&Self::default())?)
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix, e.g. DOORKNOCK__LOGGING__LEVEL
            .add_source(Environment::with_prefix("DOORKNOCK").prefix_separator("__").separator("__"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.storage.path.trim().is_empty() {
            return Err(anyhow::anyhow!("storage.path must not be empty"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        // Validate directory config
        if self.directory.dataset_path.trim().is_empty() {
            return Err(anyhow::anyhow!("directory.dataset_path must not be empty"));
        }

        let valid_parsers = ["rfc4180", "naive"];
        if !valid_parsers.contains(&self.directory.parser.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid dataset parser: {}. Must be one of: {:?}",
                self.directory.parser,
                valid_parsers
            ));
        }

        if self.directory.numeric_default < 0 {
            return Err(anyhow::anyhow!("numeric_default must not be negative"));
        }

        // Validate export config
        if self.export.output_directory.trim().is_empty() {
            return Err(anyhow::anyhow!("export.output_directory must not be empty"));
        }

        Ok(())
    }

    /// Get store path from environment or config
    pub fn get_storage_path(&self) -> PathBuf {
        std::env::var("DOORKNOCK_STORE_PATH")
            .map_or_else(|_| PathBuf::from(&self.storage.path), PathBuf::from)
    }
}
