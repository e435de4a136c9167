//! Runtime configuration
//!
//! Loads settings from an optional `settings.toml` next to the executable,
//! falling back to built-in defaults when the file is absent.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EngineError, EngineResult};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Window and presentation settings
    pub window: WindowConfig,

    /// Terrain field and mesh settings
    pub terrain: TerrainConfig,

    /// Camera feel settings
    pub camera: CameraConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,

    /// Window width in pixels (ignored when fullscreen)
    pub width: u32,

    /// Window height in pixels (ignored when fullscreen)
    pub height: u32,

    /// Start in borderless fullscreen on the current monitor
    pub fullscreen: bool,

    /// Enable VSync (Fifo presentation mode)
    pub vsync: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Height-field sample counts per axis; fixes the storage buffer size
    pub samples: [u32; 2],

    /// Rendered grid resolution per axis
    pub mesh_size: [u32; 2],

    /// Horizontal camera displacement that forces a field regeneration
    pub regen_threshold: f32,

    /// Seed fed to the generation shader
    pub seed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Key-press acceleration per frame, world units
    pub move_multiplier: f32,

    /// Per-frame linear velocity retention factor
    pub move_decay: f32,

    /// Pointer delta to angular velocity factor, degrees per pixel
    pub look_multiplier: f32,

    /// Per-frame angular velocity retention factor
    pub look_decay: f32,

    /// Pitch clamp, degrees above/below the horizon
    pub pitch_limit_deg: f32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            terrain: TerrainConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Relief Engine".to_string(),
            width: 1920,
            height: 1080,
            fullscreen: true,
            vsync: true,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            samples: [1000, 4000],
            mesh_size: [1000, 1000],
            regen_threshold: 2.5,
            seed: 0,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            move_multiplier: 0.0025,
            move_decay: 0.9,
            look_multiplier: 0.13,
            look_decay: 0.7,
            pitch_limit_deg: 80.0,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from `path`, or return defaults when the file
    /// does not exist. A present-but-malformed file is an error rather than
    /// a silent fallback.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!(
                "[Config] {} not found, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| EngineError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config: RuntimeConfig = toml::from_str(&text).map_err(|e| EngineError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        log::info!("[Config] Loaded settings from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_tuning() {
        let config = RuntimeConfig::default();
        assert_eq!(config.terrain.samples, [1000, 4000]);
        assert_eq!(config.terrain.mesh_size, [1000, 1000]);
        assert_eq!(config.terrain.regen_threshold, 2.5);
        assert_eq!(config.camera.move_multiplier, 0.0025);
        assert_eq!(config.camera.look_decay, 0.7);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: RuntimeConfig = toml::from_str(
            r#"
            [terrain]
            seed = 7
            "#,
        )
        .expect("partial config should parse");
        assert_eq!(config.terrain.seed, 7);
        assert_eq!(config.terrain.samples, [1000, 4000]);
        assert!(config.window.vsync);
    }
}
