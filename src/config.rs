// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::CameraPosition;
use crate::constants::{DEFAULT_MAX_DIMENSION, Symbology, UiLanguage, timing};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Directory name under the user's configuration directory
const CONFIG_DIR_NAME: &str = "code-scanner";
const CONFIG_FILE_NAME: &str = "config.json";

/// What happens to a pending auto-clear when a newer code is scanned
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClearPolicy {
    /// Cancel the pending clear and restart the delay for the newer result
    #[default]
    Latest,
    /// Every scheduled clear fires and wipes whatever result is showing
    Unconditional,
}

impl FromStr for ClearPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "latest" => Ok(ClearPolicy::Latest),
            "unconditional" => Ok(ClearPolicy::Unconditional),
            other => Err(format!("Unknown clear policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which way the camera should face
    pub camera_position: CameraPosition,
    /// Last used camera device path, preferred when it matches the position
    pub last_camera_path: Option<String>,
    /// Camera chosen for this run only (`--device`); wins over the position
    #[serde(skip)]
    pub device_override: Option<String>,
    /// Symbologies handed to the decoders
    pub recognized_symbologies: BTreeSet<Symbology>,
    /// How long a scanned result stays visible
    pub clear_delay_ms: u64,
    pub clear_policy: ClearPolicy,
    /// Minimum time between decoded frames
    pub sample_interval_ms: u64,
    /// Frames larger than this are downscaled before decoding
    pub max_dimension: u32,
    /// On-screen language; `None` follows the desktop's languages
    pub language: Option<UiLanguage>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_position: CameraPosition::Back,
            last_camera_path: None,
            device_override: None,
            recognized_symbologies: Symbology::DEFAULT_RECOGNIZED.into_iter().collect(),
            clear_delay_ms: timing::DEFAULT_CLEAR_DELAY_MS,
            clear_policy: ClearPolicy::default(),
            sample_interval_ms: timing::DEFAULT_SAMPLE_INTERVAL_MS,
            max_dimension: DEFAULT_MAX_DIMENSION,
            language: None,
        }
    }
}

impl Config {
    /// Default location of the configuration file
    pub fn path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load the configuration, falling back to defaults
    ///
    /// A missing file is normal on first start. A malformed file is logged
    /// and ignored so the scanner still starts.
    pub fn load() -> Self {
        let path = match Self::path() {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Using default configuration");
                return Self::default();
            }
        };

        match Self::load_from(&path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                debug!(path = %path.display(), "No configuration file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring invalid configuration");
                Self::default()
            }
        }
    }

    /// Load from an explicit path; `Ok(None)` if the file does not exist
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let config: Config = serde_json::from_str(&contents)?;
        Ok(Some(config.sanitized()))
    }

    /// Write the configuration to the default location
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    pub fn clear_delay(&self) -> Duration {
        Duration::from_millis(self.clear_delay_ms)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Replace values a hand-edited file could make unusable
    fn sanitized(mut self) -> Self {
        if self.recognized_symbologies.is_empty() {
            warn!("No symbologies configured, restoring defaults");
            self.recognized_symbologies = Symbology::DEFAULT_RECOGNIZED.into_iter().collect();
        }
        if self.max_dimension < 64 {
            self.max_dimension = DEFAULT_MAX_DIMENSION;
        }
        self
    }
}
