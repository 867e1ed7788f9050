//! Demo scene: scattered static squares and a projectile launcher
//!
//! Drives a `PhysicsWorld` the way an interactive front end would, minus the
//! window: obstacles are placed once from a seeded RNG, projectiles are fired
//! from the launcher toward a target, and bodies whose centre leaves the
//! arena are culled after each step.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::SIM_DT;
use crate::error::{PhysicsError, Result};
use crate::settings::{Settings, SettingsError};
use crate::sim::{BodyId, PhysicsWorld, RigidBody, Vector2D};

/// Arena rectangle `[0, width] x [0, height]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Edges count as inside
    pub fn contains(&self, point: Vector2D) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }
}

/// Place up to `settings.static_count` static squares
///
/// Squares never overlap each other and keep `launcher_clearance` away from
/// the launcher. A square that cannot be placed within
/// `max_placement_attempts` tries is skipped.
pub fn scatter_static_squares<R: Rng>(
    world: &mut PhysicsWorld,
    rng: &mut R,
    settings: &Settings,
) -> Result<Vec<BodyId>> {
    let mut placed: Vec<RigidBody> = Vec::with_capacity(settings.static_count as usize);
    let max_x = settings.arena_width as u32;
    let max_y = settings.arena_height as u32;

    for n in 0..settings.static_count {
        let mut attempts = 0;
        let candidate = loop {
            if attempts >= settings.max_placement_attempts {
                log::warn!("Could not place static square {} after {} attempts", n, attempts);
                break None;
            }
            attempts += 1;

            let size = rng.random_range(settings.static_size_min..=settings.static_size_max) as f32;
            let x = rng.random_range(0..=max_x) as f32;
            let y = rng.random_range(0..=max_y) as f32;
            let rotation = rng.random_range(0..=360) as f32;
            let candidate = RigidBody::new_static(size, size, x, y)?.with_angle(rotation);

            if (candidate.position() - settings.launcher).length() < settings.launcher_clearance {
                continue;
            }
            let mut overlaps = false;
            for other in &placed {
                if candidate.collide(other)?.hit {
                    overlaps = true;
                    break;
                }
            }
            if !overlaps {
                break Some(candidate);
            }
        };
        if let Some(body) = candidate {
            placed.push(body);
        }
    }

    log::info!("Placed {} of {} static squares", placed.len(), settings.static_count);
    Ok(world.extend(placed))
}

/// Fire a dynamic square from the launcher with velocity `target - launcher`
pub fn launch_projectile<R: Rng>(
    world: &mut PhysicsWorld,
    rng: &mut R,
    settings: &Settings,
    target: Vector2D,
) -> Result<BodyId> {
    let angle = rng.random_range(0..=settings.projectile_max_angle) as f32;
    let launcher = settings.launcher;
    let body = RigidBody::new(
        settings.projectile_size,
        settings.projectile_size,
        launcher.x,
        launcher.y,
    )?
    .with_angle(angle)
    .with_velocity(target - launcher);
    Ok(world.add(body))
}

/// Remove every body whose centre is outside `bounds`
pub fn cull_out_of_bounds(world: &mut PhysicsWorld, bounds: Bounds) -> Vec<BodyId> {
    world.retain(|_, body| bounds.contains(body.position()))
}

/// Snapshot of the scene for status display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneStatus {
    pub frame: u32,
    pub gravity_enabled: bool,
    /// Dynamic bodies currently alive
    pub active_objects: usize,
    pub total_bodies: usize,
    pub launched: u32,
    pub culled: u32,
}

/// Errors building or running a scene
#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}

/// A world plus the demo bookkeeping around it
#[derive(Debug, Clone)]
pub struct Scene {
    pub world: PhysicsWorld,
    pub settings: Settings,
    rng: Pcg32,
    frame: u32,
    launched: u32,
    culled: u32,
}

impl Scene {
    /// Build the world and scatter the static obstacles
    ///
    /// Settings are validated first, since they may have been built in code
    /// rather than loaded through [`Settings::from_json`].
    pub fn new(settings: Settings) -> Result<Self, SceneError> {
        settings.validate()?;
        let mut world = PhysicsWorld::new(settings.effective_gravity());
        let mut rng = Pcg32::seed_from_u64(settings.seed);
        scatter_static_squares(&mut world, &mut rng, &settings)?;
        Ok(Self {
            world,
            settings,
            rng,
            frame: 0,
            launched: 0,
            culled: 0,
        })
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Flip gravity on/off
    pub fn toggle_gravity(&mut self) {
        let gravity = self.settings.toggle_gravity();
        self.world.gravity = gravity;
        log::info!(
            "Gravity: {}",
            if self.settings.gravity_enabled { "ON" } else { "OFF" }
        );
    }

    pub fn launch_toward(&mut self, target: Vector2D) -> Result<BodyId> {
        let id = launch_projectile(&mut self.world, &mut self.rng, &self.settings, target)?;
        self.launched += 1;
        Ok(id)
    }

    /// Random point inside the arena
    pub fn random_target(&mut self) -> Vector2D {
        let x = self.rng.random_range(0.0..=self.settings.arena_width);
        let y = self.rng.random_range(0.0..=self.settings.arena_height);
        Vector2D::new(x, y)
    }

    /// One frame: scheduled events, a fixed physics step, then culling
    pub fn step(&mut self) -> Result<()> {
        if self.settings.gravity_toggle_frame == Some(self.frame) {
            self.toggle_gravity();
        }

        let interval = self.settings.launch_interval;
        if interval > 0 && self.frame % interval == 0 {
            let target = self.random_target();
            self.launch_toward(target)?;
        }

        self.world.update(SIM_DT)?;

        let removed = cull_out_of_bounds(&mut self.world, self.settings.bounds());
        self.culled += removed.len() as u32;
        self.frame += 1;
        Ok(())
    }

    pub fn status(&self) -> SceneStatus {
        SceneStatus {
            frame: self.frame,
            gravity_enabled: self.settings.gravity_enabled,
            active_objects: self.world.active_count(),
            total_bodies: self.world.len(),
            launched: self.launched,
            culled: self.culled,
        }
    }
}
