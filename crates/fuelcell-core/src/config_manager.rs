use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for crate::FuelCellError {
    fn from(err: ConfigError) -> Self {
        crate::FuelCellError::Config(err.to_string())
    }
}

/// Main configuration for the fuel cell analysis services
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FuelCellConfig {
    /// Physical stack layout used for per-cell figures
    #[serde(default)]
    pub stack: StackConfiguration,

    /// Narrative generation service
    #[serde(default)]
    pub llm: LLMConfig,

    /// HTTP server binding
    #[serde(default)]
    pub server: ServerConfig,

    /// External curve prediction service
    #[serde(default)]
    pub prediction: PredictionServiceConfig,

    /// Display options for narrative excerpts
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Stack of series-connected cells
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfiguration {
    /// Number of cells in series; stack voltage is divided by this for per-cell averages
    #[serde(default = "default_cell_count")]
    pub cell_count: u32,

    /// Lower bound of the practical per-cell operating target (V)
    #[serde(default = "default_target_cell_voltage_min")]
    pub target_cell_voltage_min: f64,

    /// Upper bound of the practical per-cell operating target (V)
    #[serde(default = "default_target_cell_voltage_max")]
    pub target_cell_voltage_max: f64,

    /// Theoretical per-cell maximum (V)
    #[serde(default = "default_max_cell_voltage")]
    pub max_cell_voltage: f64,
}

impl StackConfiguration {
    pub fn with_cell_count(cell_count: u32) -> Self {
        Self {
            cell_count,
            ..Default::default()
        }
    }

    /// Theoretical stack voltage ceiling
    pub fn max_stack_voltage(&self) -> f64 {
        self.max_cell_voltage * f64::from(self.cell_count)
    }
}

impl Default for StackConfiguration {
    fn default() -> Self {
        Self {
            cell_count: default_cell_count(),
            target_cell_voltage_min: default_target_cell_voltage_min(),
            target_cell_voltage_max: default_target_cell_voltage_max(),
            max_cell_voltage: default_max_cell_voltage(),
        }
    }
}

/// LLM configuration for narrative generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// LLM provider: "gemini" or "openai-compatible"
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// Model identifier (e.g., "gemini-2.5-flash")
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Base URL override (required for openai-compatible)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Google API key for Gemini
    #[serde(default, skip_serializing)]
    pub google_api_key: Option<String>,

    /// API key for OpenAI-compatible endpoints
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Top-p nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Maximum output tokens
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: usize,

    /// Deadline imposed on a single narrative request, in seconds
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            base_url: None,
            google_api_key: None,
            api_key: None,
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
            deadline_secs: default_deadline_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin allowed by CORS (the web front end)
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origin: default_allowed_origin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionServiceConfig {
    #[serde(default = "default_prediction_url")]
    pub base_url: String,
    #[serde(default = "default_prediction_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PredictionServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_prediction_url(),
            timeout_secs: default_prediction_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Maximum characters in a narrative preview
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            preview_chars: default_preview_chars(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "off", "trace", "debug", "info", "warn", "error", or filter directives.
    /// `RUST_LOG`, when set, takes precedence at subscriber initialisation.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_cell_count() -> u32 {
    400
}
fn default_target_cell_voltage_min() -> f64 {
    0.6
}
fn default_target_cell_voltage_max() -> f64 {
    0.7
}
fn default_max_cell_voltage() -> f64 {
    1.25
}
fn default_llm_provider() -> String {
    "gemini".to_string()
}
fn default_llm_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_top_p() -> f32 {
    0.8
}
fn default_max_output_tokens() -> usize {
    8192
}
fn default_deadline_secs() -> u64 {
    120
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_allowed_origin() -> String {
    "http://localhost:3000".to_string()
}
fn default_prediction_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_prediction_timeout_secs() -> u64 {
    30
}
fn default_preview_chars() -> usize {
    300
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

pub const SUPPORTED_LLM_PROVIDERS: &[&str] = &["gemini", "openai-compatible"];

/// Configuration manager with layered loading
pub struct ConfigManager {
    config: FuelCellConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (.fuelcell.toml)
    /// 3. Sensible defaults
    pub fn load() -> Result<Self, ConfigError> {
        info!("Loading fuel cell analysis configuration");

        Self::load_dotenv();

        let (config, config_path) = Self::load_config_file()?;
        Self::finish(config, config_path)
    }

    /// Load from an explicit file, still applying environment overrides
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        Self::load_dotenv();

        let config = Self::read_toml_file(path)?;
        Self::finish(config, Some(path.to_path_buf()))
    }

    /// Wrap an already-built configuration without touching the environment
    pub fn from_config(config: FuelCellConfig) -> Result<Self, ConfigError> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    fn finish(config: FuelCellConfig, config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        info!("Configuration loaded");
        match config_path {
            Some(ref path) => info!(path = %path.display(), "Config file"),
            None => info!("No config file, using defaults"),
        }
        info!(
            cells = config.stack.cell_count,
            provider = %config.llm.provider,
            model = %config.llm.model,
            "Stack and narrative provider"
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Load .env file if it exists
    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            } else {
                info!("Loaded .env file from current directory");
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".fuelcell.env");
            if home_env.exists() {
                if let Err(e) = dotenv::from_path(&home_env) {
                    warn!("Failed to load .fuelcell.env: {}", e);
                } else {
                    info!("Loaded .fuelcell.env from home directory");
                }
            }
        }
    }

    /// Find and load config file
    /// Search order:
    /// 1. ./.fuelcell.toml (current directory)
    /// 2. ~/.fuelcell/config.toml (user config)
    /// 3. Use defaults
    fn load_config_file() -> Result<(FuelCellConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".fuelcell.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".fuelcell").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((FuelCellConfig::default(), None))
    }

    /// Read TOML config file
    fn read_toml_file(path: &Path) -> Result<FuelCellConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: FuelCellConfig) -> FuelCellConfig {
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            config.llm.google_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("FUELCELL_LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(provider) = std::env::var("FUELCELL_LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(model) = std::env::var("FUELCELL_MODEL") {
            config.llm.model = model;
        }
        if let Ok(url) = std::env::var("FUELCELL_LLM_BASE_URL") {
            config.llm.base_url = Some(url);
        }
        if let Ok(cells) = std::env::var("FUELCELL_CELL_COUNT") {
            match cells.parse() {
                Ok(n) => config.stack.cell_count = n,
                Err(_) => warn!(value = %cells, "Ignoring unparsable FUELCELL_CELL_COUNT"),
            }
        }
        if let Ok(url) = std::env::var("FUELCELL_PREDICTION_URL") {
            config.prediction.base_url = url;
        }
        if let Ok(host) = std::env::var("FUELCELL_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("FUELCELL_PORT") {
            if let Ok(p) = port.parse() {
                config.server.port = p;
            }
        }

        config
    }

    /// Validate configuration
    pub fn validate_config(config: &FuelCellConfig) -> Result<(), ConfigError> {
        if config.stack.cell_count == 0 {
            return Err(ConfigError::ValidationError(
                "stack.cell_count must be at least 1".to_string(),
            ));
        }

        if !SUPPORTED_LLM_PROVIDERS.contains(&config.llm.provider.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid LLM provider: {}. Must be one of: {}",
                config.llm.provider,
                SUPPORTED_LLM_PROVIDERS.join(", ")
            )));
        }

        if !(0.0..=2.0).contains(&config.llm.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                config.llm.temperature
            )));
        }

        if config.display.preview_chars == 0 {
            return Err(ConfigError::ValidationError(
                "display.preview_chars must be at least 1".to_string(),
            ));
        }

        match config.logging.level.to_ascii_lowercase().as_str() {
            "off" | "trace" | "debug" | "info" | "warn" | "error" => {}
            // Filter directives such as "fuelcell_api=debug,tower_http=info" are passed through
            other if other.contains('=') || other.contains(',') => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {}. Must be one of: off, trace, debug, info, warn, error",
                    config.logging.level
                )))
            }
        }

        match config.logging.format.as_str() {
            "pretty" | "json" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, json, compact",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &FuelCellConfig {
        &self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Create a default config file
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let config = FuelCellConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        }

        std::fs::write(path, toml_str).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = FuelCellConfig::default();
        assert!(ConfigManager::validate_config(&config).is_ok());
        assert_eq!(config.stack.cell_count, 400);
        assert_eq!(config.display.preview_chars, 300);
        assert!((config.stack.max_stack_voltage() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_cell_count_rejected() {
        let mut config = FuelCellConfig::default();
        config.stack.cell_count = 0;
        let err = ConfigManager::from_config(config).err().unwrap();
        assert!(err.to_string().contains("cell_count"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = FuelCellConfig::default();
        config.llm.provider = "carrier-pigeon".to_string();
        assert!(ConfigManager::validate_config(&config).is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: FuelCellConfig = toml::from_str(
            r#"
            [stack]
            cell_count = 120

            [llm]
            model = "gemini-2.0-flash"
            "#,
        )
        .unwrap();

        assert_eq!(config.stack.cell_count, 120);
        assert_eq!(config.stack.target_cell_voltage_min, 0.6);
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_api_keys_are_not_serialized() {
        let mut config = FuelCellConfig::default();
        config.llm.google_api_key = Some("secret".to_string());
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_rust_log_does_not_leak_into_logging_config() {
        std::env::set_var("RUST_LOG", "off");
        let file = tempfile::NamedTempFile::new().unwrap();

        let manager = ConfigManager::load_from_path(file.path()).unwrap();
        assert_eq!(manager.config().logging.level, "info");
    }

    #[test]
    fn test_filter_style_log_levels_accepted() {
        let mut config = FuelCellConfig::default();
        for level in ["off", "INFO", "fuelcell_api=debug,tower_http=info"] {
            config.logging.level = level.to_string();
            assert!(ConfigManager::validate_config(&config).is_ok(), "{}", level);
        }

        config.logging.level = "loud".to_string();
        assert!(ConfigManager::validate_config(&config).is_err());
    }
}
