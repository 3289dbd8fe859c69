// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::types::SensorRotation;
use crate::backends::virtual_camera::SyntheticCameraConfig;
use crate::constants::{
    DEFAULT_BUFFER_POOL_SIZE, DEFAULT_FRAMERATE, DEFAULT_HEIGHT, DEFAULT_SENSOR_ROTATION,
    DEFAULT_WIDTH, filter,
};
use crate::errors::{AppError, AppResult};
use crate::media::orientation::Orientation;
use crate::pipelines::{AnalyzerSettings, FilterKind, FilterParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "camera-filter";
const CONFIG_FILE_NAME: &str = "config.json";

/// Vintage filter tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VintageSettings {
    /// Lifted blacks and muted colours (0.0..=0.5)
    pub fade: f32,
    /// Corner darkening (0.0..=1.0)
    pub vignette_strength: f32,
}

impl Default for VintageSettings {
    fn default() -> Self {
        Self {
            fade: filter::DEFAULT_VINTAGE_FADE,
            vignette_strength: filter::DEFAULT_VIGNETTE_STRENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter selected at startup
    pub default_filter: FilterKind,
    /// Capture width (sensor orientation)
    pub width: u32,
    /// Capture height (sensor orientation)
    pub height: u32,
    /// Capture framerate
    pub framerate: u32,
    /// Clockwise sensor mount offset in degrees (multiple of 90)
    pub sensor_rotation: i32,
    /// Mirror camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
    /// Weight of the warm tint blended over sepia output
    pub sepia_tint_weight: f32,
    pub vintage: VintageSettings,
    /// Longest edge of the reference raster; unset keeps full size
    pub thumbnail_max_edge: Option<u32>,
    /// Frame buffers the camera may lend out at once
    pub buffer_pool_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_filter: FilterKind::Identity,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            framerate: DEFAULT_FRAMERATE,
            sensor_rotation: DEFAULT_SENSOR_ROTATION as i32,
            mirror_preview: false,
            sepia_tint_weight: filter::DEFAULT_SEPIA_TINT_WEIGHT,
            vintage: VintageSettings::default(),
            thumbnail_max_edge: None,
            buffer_pool_size: DEFAULT_BUFFER_POOL_SIZE,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::Config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Write to the default location, returning the path written
    pub fn save(&self) -> AppResult<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| AppError::Config("No config directory available".into()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Config(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| AppError::Config(format!("Failed to write {}: {}", path.display(), e)))?;

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Check every field against its allowed range
    pub fn validate(&self) -> AppResult<()> {
        if self.width == 0 || self.height == 0 || self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(AppError::Config(format!(
                "Resolution must be non-zero and even, got {}x{}",
                self.width, self.height
            )));
        }
        if !(1..=240).contains(&self.framerate) {
            return Err(AppError::Config(format!(
                "Framerate must be between 1 and 240, got {}",
                self.framerate
            )));
        }
        self.rotation()?;
        if !(0.0..=1.0).contains(&self.sepia_tint_weight) {
            return Err(AppError::Config(format!(
                "Sepia tint weight must be between 0 and 1, got {}",
                self.sepia_tint_weight
            )));
        }
        if !(0.0..=0.5).contains(&self.vintage.fade) {
            return Err(AppError::Config(format!(
                "Vintage fade must be between 0 and 0.5, got {}",
                self.vintage.fade
            )));
        }
        if !(0.0..=1.0).contains(&self.vintage.vignette_strength) {
            return Err(AppError::Config(format!(
                "Vignette strength must be between 0 and 1, got {}",
                self.vintage.vignette_strength
            )));
        }
        if self.vintage.fade == 0.0 && self.vintage.vignette_strength == 0.0 {
            return Err(AppError::Config(
                "Vintage needs a non-zero fade or vignette strength".into(),
            ));
        }
        if self.thumbnail_max_edge == Some(0) {
            return Err(AppError::Config(
                "Thumbnail edge must be positive (omit it to keep full size)".into(),
            ));
        }
        if self.buffer_pool_size == 0 {
            return Err(AppError::Config("Buffer pool size must be at least 1".into()));
        }
        Ok(())
    }

    /// Sensor rotation as a right angle
    pub fn rotation(&self) -> AppResult<SensorRotation> {
        SensorRotation::from_degrees_int(self.sensor_rotation).ok_or_else(|| {
            AppError::Config(format!(
                "Sensor rotation must be a multiple of 90 degrees, got {}",
                self.sensor_rotation
            ))
        })
    }

    pub fn filter_params(&self) -> FilterParams {
        FilterParams {
            sepia_tint_weight: self.sepia_tint_weight,
            vintage_fade: self.vintage.fade,
            vignette_strength: self.vintage.vignette_strength,
        }
    }

    /// Settings for the analysis pipeline
    pub fn analyzer_settings(&self) -> AppResult<AnalyzerSettings> {
        Ok(AnalyzerSettings {
            filter: self.default_filter,
            params: self.filter_params(),
            orientation: Orientation::new(self.rotation()?, self.mirror_preview),
            thumbnail_max_edge: self.thumbnail_max_edge,
        })
    }

    /// Settings for the synthetic camera
    pub fn camera_config(&self) -> SyntheticCameraConfig {
        SyntheticCameraConfig {
            width: self.width,
            height: self.height,
            framerate: self.framerate,
            pool_size: self.buffer_pool_size,
            ..SyntheticCameraConfig::default()
        }
    }
}
