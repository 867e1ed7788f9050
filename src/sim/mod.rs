//! Rigid-body simulation core
//!
//! Everything here is pure and deterministic:
//! - Fixed timestep supplied by the caller
//! - Stable iteration order (insertion order)
//! - No rendering, windowing or platform dependencies

pub mod body;
pub mod collision;
pub mod vector;
pub mod world;

pub use body::{BodyId, BodyKind, RigidBody};
pub use collision::{CollisionResult, Segment, line_intersection};
pub use vector::Vector2D;
pub use world::PhysicsWorld;
