//! Error types for the physics core

use thiserror::Error;

use crate::sim::BodyId;

/// Errors raised by vector math, body construction and world management.
///
/// These are caller-misuse errors: they fail loudly instead of letting a NaN
/// or infinity leak into the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PhysicsError {
    /// A generic value did not have exactly two components.
    #[error("expected {expected} components, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Normalizing a vector whose length is exactly zero.
    #[error("cannot normalize a zero-length vector")]
    ZeroLengthVector,

    /// Dividing a vector by exactly zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Dividing a vector by NaN or infinity.
    #[error("divisor must be finite, got {0}")]
    NonFiniteScalar(f32),

    /// A division produced a non-finite component (overflow).
    #[error("division produced a non-finite result")]
    NonFiniteResult,

    /// Width or height is not a positive finite number.
    #[error("invalid body dimensions {width}x{height}")]
    InvalidDimensions { width: f32, height: f32 },

    /// Mass is neither positive-finite nor the infinite (static) sentinel.
    #[error("invalid mass {0}")]
    InvalidMass(f32),

    /// The body is not (or no longer) part of the world.
    #[error("body {0} is not in the world")]
    UnknownBody(BodyId),

    /// Two bodies in a snapshot share a handle.
    #[error("body {0} appears more than once")]
    DuplicateBody(BodyId),
}

pub type Result<T, E = PhysicsError> = std::result::Result<T, E>;
