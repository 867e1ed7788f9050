//! Square Physics - a small 2D rigid-body core for rotating rectangles
//!
//! Core modules:
//! - `sim`: Deterministic simulation (vectors, bodies, SAT collisions, world step)
//! - `scene`: Seeded demo scene (static obstacles, projectile launcher, culling)
//! - `settings`: Data-driven demo configuration

pub mod error;
pub mod scene;
pub mod settings;
pub mod sim;

pub use error::PhysicsError;
pub use settings::{Settings, SettingsError};
pub use sim::{BodyId, BodyKind, PhysicsWorld, RigidBody, Vector2D};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// World gravity when none is given
    pub const DEFAULT_GRAVITY: f32 = 9.8;
    /// Gravity used by the demo scene (pixels/s²)
    pub const DEMO_GRAVITY: f32 = 200.0;

    /// Body restitution when none is given
    pub const DEFAULT_RESTITUTION: f32 = 0.5;
}
