//! Configuration module for the roll copier
//!
//! Supports loading configuration from a JSON file.
//! Configuration is stored in a standard location:
//! - Windows: %APPDATA%\photo_roll_copier\config.json
//! - Linux/macOS: ~/.config/photo_roll_copier/config.json
//!
//! Only `use_desktop` and `custom_path` decide where rolls are copied to; the
//! remaining fields tune device lookup, copy timings and the ETA heuristics
//! and all have defaults, so a two-field file is a complete config.

use crate::core::copier::CopyTimings;
use crate::core::eta::{DEFAULT_FOLDER_SIZE_SKEW, DEFAULT_SCAN_OVERHEAD};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Application name used for config directory
const APP_NAME: &str = "photo_roll_copier";

/// Default config file name
const CONFIG_FILE_NAME: &str = "config.json";

/// Folder created on the desktop when no custom destination is configured
pub const DEFAULT_ROLL_FOLDER: &str = "photo_iphone";

/// Get the standard configuration directory for the application.
///
/// Returns:
/// - Windows: %APPDATA%\photo_roll_copier
/// - Linux/macOS: ~/.config/photo_roll_copier
pub fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_NAME))
    }

    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir().map(|home| home.join(".config").join(APP_NAME))
    }
}

/// Get the standard configuration file path.
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// `<home>/Desktop/photo_iphone`
pub fn default_destination_in(home: &Path) -> PathBuf {
    home.join("Desktop").join(DEFAULT_ROLL_FOLDER)
}

/// Where connected devices show up as directories on this platform
///
/// `None` where the OS does not mount phones as a directory tree (Windows
/// exposes them only through the shell namespace); `devices_root` must then
/// be configured explicitly.
pub fn default_devices_root() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        Some(
            dirs::runtime_dir()
                .map(|dir| dir.join("gvfs"))
                .unwrap_or_else(|| PathBuf::from("/media")),
        )
    }

    #[cfg(target_os = "macos")]
    {
        Some(PathBuf::from("/Volumes"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Copy into `<home>/Desktop/photo_iphone`
    pub use_desktop: bool,

    /// Destination used when `use_desktop` is false
    pub custom_path: String,

    /// Directory under which connected devices are exposed
    pub devices_root: Option<PathBuf>,

    /// Case-insensitive substrings identifying the device entry
    pub device_name_patterns: Vec<String>,

    /// Name of the storage folder beneath the device entry
    pub storage_folder: String,

    /// Copy strategy timings
    pub timings: TimingConfig,

    /// ETA calibration constants
    pub eta: EtaConfig,

    /// Log level: error, warn, info, debug, trace
    pub log_level: String,

    /// Log file name, created inside the destination directory
    pub log_file_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_desktop: true,
            custom_path: String::new(),
            devices_root: None,
            device_name_patterns: vec!["iphone".to_string(), "apple".to_string()],
            storage_folder: "Internal Storage".to_string(),
            timings: TimingConfig::default(),
            eta: EtaConfig::default(),
            log_level: "info".to_string(),
            log_file_name: "log.txt".to_string(),
        }
    }
}

/// Settle intervals of the copy strategies, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Wait after the direct transfer before checking the destination
    pub primary_settle_ms: u64,

    /// Wait after the clipboard paste before checking the destination
    pub fallback_settle_ms: u64,

    /// Keep polling the destination until this much time has passed
    pub verify_timeout_ms: Option<u64>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            primary_settle_ms: 30,
            fallback_settle_ms: 100,
            verify_timeout_ms: None,
        }
    }
}

impl TimingConfig {
    pub fn to_copy_timings(&self) -> CopyTimings {
        CopyTimings {
            primary_settle: Duration::from_millis(self.primary_settle_ms),
            fallback_settle: Duration::from_millis(self.fallback_settle_ms),
            verify_timeout: self.verify_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Multipliers applied by the ETA estimator
///
/// Neither value has been calibrated against measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtaConfig {
    /// Remote directory scan overhead not captured by per-file timing
    pub scan_overhead: f64,

    /// Inflation of the average folder size (later rolls tend to be larger)
    pub folder_size_skew: f64,
}

impl Default for EtaConfig {
    fn default() -> Self {
        Self {
            scan_overhead: DEFAULT_SCAN_OVERHEAD,
            folder_size_skew: DEFAULT_FOLDER_SIZE_SKEW,
        }
    }
}

/// How the configuration in use was obtained
#[derive(Debug)]
pub enum ConfigSource {
    /// Read from an existing file
    Loaded(PathBuf),
    /// No file existed; defaults were written to this path
    CreatedDefault(PathBuf),
    /// Defaults are in use because the file could not be read or written
    Fallback(ConfigError),
}

/// A configuration together with where it came from
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
}

/// The resolved copy destination
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    pub path: PathBuf,
    /// Set when a configured custom path was rejected
    pub warning: Option<String>,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;

        Ok(config)
    }

    /// Save configuration to a JSON file, creating its directory if needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(parent.to_path_buf(), e.to_string()))?;
        }

        fs::write(path, content)
            .map_err(|e| ConfigError::WriteError(path.to_path_buf(), e.to_string()))?;

        Ok(())
    }

    /// Load the config at `path`, writing defaults there on first run
    ///
    /// Never fails: any read, parse or write problem yields the default
    /// configuration with the error recorded in [`ConfigSource::Fallback`].
    pub fn load_or_init<P: AsRef<Path>>(path: P) -> LoadedConfig {
        let path = path.as_ref();

        if !path.exists() {
            let config = Config::default();
            let source = match config.save(path) {
                Ok(()) => ConfigSource::CreatedDefault(path.to_path_buf()),
                Err(e) => ConfigSource::Fallback(e),
            };
            return LoadedConfig { config, source };
        }

        match Self::load(path) {
            Ok(config) => LoadedConfig {
                config,
                source: ConfigSource::Loaded(path.to_path_buf()),
            },
            Err(e) => LoadedConfig {
                config: Config::default(),
                source: ConfigSource::Fallback(e),
            },
        }
    }

    /// Load from the standard location
    pub fn load_default() -> LoadedConfig {
        match get_config_path() {
            Some(path) => Self::load_or_init(path),
            None => LoadedConfig {
                config: Config::default(),
                source: ConfigSource::Fallback(ConfigError::ConfigDirNotFound),
            },
        }
    }

    /// Resolve the destination directory against the user's home
    pub fn resolve_destination(&self) -> Destination {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        self.resolve_destination_in(&home)
    }

    /// Resolve the destination directory against an explicit home directory
    ///
    /// A custom path is accepted when it is non-empty and its parent directory
    /// exists; otherwise the desktop default is used and a warning returned.
    pub fn resolve_destination_in(&self, home: &Path) -> Destination {
        let default = default_destination_in(home);

        if self.use_desktop {
            return Destination {
                path: default,
                warning: None,
            };
        }

        let custom = Path::new(&self.custom_path);
        let parent_exists = custom
            .parent()
            .is_some_and(|parent| !parent.as_os_str().is_empty() && parent.exists());

        if !self.custom_path.is_empty() && parent_exists {
            Destination {
                path: custom.to_path_buf(),
                warning: None,
            }
        } else {
            Destination {
                warning: Some(format!(
                    "Invalid custom path: '{}'. Using {} as fallback.",
                    self.custom_path,
                    default.display()
                )),
                path: default,
            }
        }
    }

    /// Directory where devices are looked up, if one is known
    pub fn effective_devices_root(&self) -> Option<PathBuf> {
        self.devices_root.clone().or_else(default_devices_root)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file was not found at the specified path
    #[error("Configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    /// Failed to read the configuration file
    #[error("Failed to read configuration file '{}': {}", .0.display(), .1)]
    ReadError(PathBuf, String),
    /// Failed to parse the configuration file (invalid JSON)
    #[error("Failed to parse configuration file '{}': {}", .0.display(), .1)]
    ParseError(PathBuf, String),
    /// Failed to serialize configuration to JSON
    #[error("Failed to serialize configuration: {0}")]
    SerializeError(String),
    /// Failed to write configuration file
    #[error("Failed to write configuration file '{}': {}", .0.display(), .1)]
    WriteError(PathBuf, String),
    /// Could not determine config directory
    #[error("Could not determine configuration directory")]
    ConfigDirNotFound,
}
