use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::{LoopConfig, SoundConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::gameplay::{CourtyardSettings, InventoryCounts, Populations};

pub(crate) const CONFIG_ENV_VAR: &str = "COURTYARD_CONFIG";
pub(crate) const SEED_ENV_VAR: &str = "COURTYARD_SEED";
pub(crate) const DEFAULT_CONFIG_FILE: &str = "courtyard.json";
const MAX_SNOW_FLAKES: usize = 20_000;
const MAX_POPULATION: usize = 200;
const MAX_TARGET_TPS: u32 = 240;
const MAX_PIXEL_RATIO: u32 = 16;

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config '{path}' at {field}: {source}")]
    Json {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config '{path}': {field} {message}")]
    Validation {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
    #[error("{var} must be an unsigned integer, got {value:?}")]
    InvalidSeed { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct InventoryConfig {
    pub(crate) champagne: u32,
    pub(crate) sparkler: u32,
    pub(crate) firework: u32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            champagne: 10,
            sparkler: 1,
            firework: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct PopulationConfig {
    pub(crate) pedestrians: usize,
    pub(crate) skaters: usize,
    pub(crate) x_cars: usize,
    pub(crate) z_cars: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        let populations = Populations::default();
        Self {
            pedestrians: populations.pedestrians,
            skaters: populations.skaters,
            x_cars: populations.x_cars,
            z_cars: populations.z_cars,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WindowConfig {
    pub(crate) title: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) target_tps: u32,
    pub(crate) pixel_ratio: u32,
    pub(crate) max_render_fps: Option<u32>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        let defaults = LoopConfig::default();
        Self {
            title: defaults.window_title,
            width: defaults.window_width,
            height: defaults.window_height,
            target_tps: defaults.target_tps,
            pixel_ratio: defaults.pixel_ratio,
            max_render_fps: defaults.max_render_fps,
        }
    }
}

/// Everything tunable about a run. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct CourtyardConfig {
    /// Fixed world seed; a fresh one is drawn per run when absent.
    pub(crate) seed: Option<u64>,
    pub(crate) snow_flakes: usize,
    pub(crate) inventory: InventoryConfig,
    pub(crate) populations: PopulationConfig,
    pub(crate) window: WindowConfig,
    pub(crate) sound: SoundConfig,
}

impl Default for CourtyardConfig {
    fn default() -> Self {
        Self {
            seed: None,
            snow_flakes: CourtyardSettings::default().snow_flakes,
            inventory: InventoryConfig::default(),
            populations: PopulationConfig::default(),
            window: WindowConfig::default(),
            sound: SoundConfig::default(),
        }
    }
}

impl CourtyardConfig {
    /// Reads `COURTYARD_CONFIG` (or `<root>/courtyard.json`) and applies `COURTYARD_SEED`.
    pub(crate) fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join(DEFAULT_CONFIG_FILE));
        let mut config = Self::load_from_path(&path)?;
        if let Some(seed) = parse_seed_override(env::var(SEED_ENV_VAR).ok())? {
            info!(seed, env_var = SEED_ENV_VAR, "config_seed_override");
            config.seed = Some(seed);
        }
        Ok(config)
    }

    /// A missing file yields the defaults; anything else unreadable is an error.
    pub(crate) fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "config_missing_using_defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = Self::parse(path, &raw)?;
        config.validate(path)?;
        info!(path = %path.display(), "config_loaded");
        Ok(config)
    }

    fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let field = error.path().to_string();
            ConfigError::Json {
                path: path.to_path_buf(),
                field: if field.is_empty() {
                    ".".to_string()
                } else {
                    field
                },
                source: error.into_inner(),
            }
        })
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, message: String| ConfigError::Validation {
            path: path.to_path_buf(),
            field,
            message,
        };

        if self.snow_flakes > MAX_SNOW_FLAKES {
            return Err(invalid(
                "snow_flakes",
                format!("must be at most {MAX_SNOW_FLAKES}, got {}", self.snow_flakes),
            ));
        }
        let populations = &self.populations;
        let total = populations.pedestrians + populations.skaters + populations.x_cars + populations.z_cars;
        if total > MAX_POPULATION {
            return Err(invalid(
                "populations",
                format!("must total at most {MAX_POPULATION}, got {total}"),
            ));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(invalid(
                "window",
                format!(
                    "size must be non-zero, got {}x{}",
                    self.window.width, self.window.height
                ),
            ));
        }
        if !(1..=MAX_TARGET_TPS).contains(&self.window.target_tps) {
            return Err(invalid(
                "window.target_tps",
                format!("must be in 1..={MAX_TARGET_TPS}, got {}", self.window.target_tps),
            ));
        }
        if !(1..=MAX_PIXEL_RATIO).contains(&self.window.pixel_ratio) {
            return Err(invalid(
                "window.pixel_ratio",
                format!("must be in 1..={MAX_PIXEL_RATIO}, got {}", self.window.pixel_ratio),
            ));
        }
        if self.window.max_render_fps == Some(0) {
            return Err(invalid("window.max_render_fps", "must be non-zero".to_string()));
        }
        let volume = self.sound.master_volume;
        if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
            return Err(invalid(
                "sound.master_volume",
                format!("must be in 0.0..=1.0, got {volume}"),
            ));
        }
        Ok(())
    }

    pub(crate) fn to_settings(&self, seed: u64) -> CourtyardSettings {
        let inventory = self.inventory;
        let populations = self.populations;
        CourtyardSettings {
            seed,
            inventory: InventoryCounts::new(inventory.champagne, inventory.sparkler, inventory.firework),
            populations: Populations {
                pedestrians: populations.pedestrians,
                skaters: populations.skaters,
                x_cars: populations.x_cars,
                z_cars: populations.z_cars,
            },
            snow_flakes: self.snow_flakes,
        }
    }

    pub(crate) fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            window_title: self.window.title.clone(),
            window_width: self.window.width,
            window_height: self.window.height,
            target_tps: self.window.target_tps,
            pixel_ratio: self.window.pixel_ratio,
            max_render_fps: self.window.max_render_fps,
            ..LoopConfig::default()
        }
    }
}

fn parse_seed_override(raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidSeed {
            var: SEED_ENV_VAR,
            value: raw.clone(),
        })
}
