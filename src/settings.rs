//! Demo settings
//!
//! Loaded from an optional JSON file; every field has a default so partial
//! files are fine.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::DEMO_GRAVITY;
use crate::scene::Bounds;
use crate::sim::Vector2D;

/// Errors loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Demo/simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === World ===
    /// Gravity strength while gravity is on
    pub gravity: f32,
    pub gravity_enabled: bool,

    // === Arena ===
    pub arena_width: f32,
    pub arena_height: f32,

    // === Static obstacles ===
    pub static_count: u32,
    /// Side length range (inclusive) for obstacle squares
    pub static_size_min: u32,
    pub static_size_max: u32,
    /// Give up placing an obstacle after this many rejected positions
    pub max_placement_attempts: u32,

    // === Launcher ===
    pub launcher: Vector2D,
    /// Obstacles keep at least this distance from the launcher
    pub launcher_clearance: f32,
    pub projectile_size: f32,
    /// Projectiles spawn at a random angle in [0, max] degrees
    pub projectile_max_angle: u32,

    // === Run ===
    pub seed: u64,
    pub frames: u32,
    /// Fire a projectile every N frames (0 = never)
    pub launch_interval: u32,
    /// Flip gravity on/off at this frame
    pub gravity_toggle_frame: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gravity: DEMO_GRAVITY,
            gravity_enabled: true,

            arena_width: 1280.0,
            arena_height: 768.0,

            static_count: 30,
            static_size_min: 30,
            static_size_max: 100,
            max_placement_attempts: 1000,

            launcher: Vector2D::new(640.0, 200.0),
            launcher_clearance: 100.0,
            projectile_size: 20.0,
            projectile_max_angle: 90,

            seed: 0x5eed,
            frames: 600,
            launch_interval: 30,
            gravity_toggle_frame: None,
        }
    }
}

impl Settings {
    /// Gravity to feed the world right now
    pub fn effective_gravity(&self) -> f32 {
        if self.gravity_enabled {
            self.gravity
        } else {
            0.0
        }
    }

    /// Flip gravity and return the new effective value
    pub fn toggle_gravity(&mut self) -> f32 {
        self.gravity_enabled = !self.gravity_enabled;
        self.effective_gravity()
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.arena_width, self.arena_height)
    }

    /// Reject values the scene builder cannot work with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !(positive(self.arena_width) && positive(self.arena_height)) {
            return Err(SettingsError::Invalid(format!(
                "arena must have positive finite size, got {}x{}",
                self.arena_width, self.arena_height
            )));
        }
        if self.static_size_min == 0 || self.static_size_min > self.static_size_max {
            return Err(SettingsError::Invalid(format!(
                "static size range {}..={} is empty or zero",
                self.static_size_min, self.static_size_max
            )));
        }
        if !positive(self.projectile_size) {
            return Err(SettingsError::Invalid(format!(
                "projectile size must be positive and finite, got {}",
                self.projectile_size
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let settings = Self::from_json(&fs::read_to_string(path)?)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
