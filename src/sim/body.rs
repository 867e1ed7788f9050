//! Rectangular rigid bodies
//!
//! A body is a `width` x `height` rectangle centred on its centre of mass.
//! Its corners and edges are never cached: they are derived from the pose on
//! every query so they cannot drift out of sync with `position`/`angle`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::vector::Vector2D;
use crate::consts::DEFAULT_RESTITUTION;
use crate::error::{PhysicsError, Result};

/// Handle for a body owned by a [`PhysicsWorld`](super::PhysicsWorld)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub(crate) u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a body responds to forces and impulses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodyKind {
    /// Moves under forces and collision response
    Dynamic { mass: f32 },
    /// Immovable level geometry (infinite mass and inertia)
    Static,
}

/// A rotating rectangle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawBody")]
pub struct RigidBody {
    width: f32,
    height: f32,
    pub(crate) position: Vector2D,
    /// Orientation in degrees
    pub(crate) angle: f32,
    pub(crate) velocity: Vector2D,
    /// Degrees per second
    pub(crate) angular_velocity: f32,
    kind: BodyKind,
    restitution: f32,
    /// Net force for the current step only
    #[serde(skip)]
    forces: Vector2D,
    #[serde(skip)]
    torque: f32,
}

/// Serialized form of a body, checked on the way in
#[derive(Deserialize)]
struct RawBody {
    width: f32,
    height: f32,
    position: Vector2D,
    angle: f32,
    velocity: Vector2D,
    angular_velocity: f32,
    kind: BodyKind,
    restitution: f32,
}

impl TryFrom<RawBody> for RigidBody {
    type Error = PhysicsError;

    fn try_from(raw: RawBody) -> Result<Self> {
        check_dimensions(raw.width, raw.height)?;
        let kind = match raw.kind {
            BodyKind::Dynamic { mass } => dynamic_kind(mass)?,
            BodyKind::Static => BodyKind::Static,
        };
        Ok(Self {
            width: raw.width,
            height: raw.height,
            position: raw.position,
            angle: raw.angle,
            velocity: raw.velocity,
            angular_velocity: raw.angular_velocity,
            kind,
            restitution: raw.restitution,
            forces: Vector2D::ZERO,
            torque: 0.0,
        })
    }
}

fn check_dimensions(width: f32, height: f32) -> Result<()> {
    if width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidDimensions { width, height })
    }
}

/// Dynamic bodies need a positive finite mass
fn dynamic_kind(mass: f32) -> Result<BodyKind> {
    if mass.is_finite() && mass > 0.0 {
        Ok(BodyKind::Dynamic { mass })
    } else {
        Err(PhysicsError::InvalidMass(mass))
    }
}

impl RigidBody {
    /// Create a dynamic body with mass `width * height`, angle 0 and the
    /// default restitution.
    ///
    /// Fails if the default mass overflows.
    pub fn new(width: f32, height: f32, x: f32, y: f32) -> Result<Self> {
        check_dimensions(width, height)?;
        let kind = dynamic_kind(width * height)?;
        Ok(Self::with_kind(width, height, x, y, kind))
    }

    /// Create an immovable body
    pub fn new_static(width: f32, height: f32, x: f32, y: f32) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self::with_kind(width, height, x, y, BodyKind::Static))
    }

    fn with_kind(width: f32, height: f32, x: f32, y: f32, kind: BodyKind) -> Self {
        Self {
            width,
            height,
            position: Vector2D::new(x, y),
            angle: 0.0,
            velocity: Vector2D::ZERO,
            angular_velocity: 0.0,
            kind,
            restitution: DEFAULT_RESTITUTION,
            forces: Vector2D::ZERO,
            torque: 0.0,
        }
    }

    pub fn with_angle(mut self, degrees: f32) -> Self {
        self.angle = degrees;
        self
    }

    /// Override the mass. `f32::INFINITY` turns the body static.
    pub fn with_mass(mut self, mass: f32) -> Result<Self> {
        self.kind = if mass == f32::INFINITY {
            BodyKind::Static
        } else {
            dynamic_kind(mass)?
        };
        Ok(self)
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_velocity(mut self, velocity: Vector2D) -> Self {
        self.set_velocity(velocity);
        self
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn position(&self) -> Vector2D {
        self.position
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn velocity(&self) -> Vector2D {
        self.velocity
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        matches!(self.kind, BodyKind::Static)
    }

    /// Mass, or `f32::INFINITY` for static bodies
    pub fn mass(&self) -> f32 {
        match self.kind {
            BodyKind::Dynamic { mass } => mass,
            BodyKind::Static => f32::INFINITY,
        }
    }

    /// Moment of inertia of a solid rectangle: `m(w² + h²)/12`
    pub fn inertia(&self) -> f32 {
        match self.kind {
            BodyKind::Dynamic { mass } => {
                mass * (self.width * self.width + self.height * self.height) / 12.0
            }
            BodyKind::Static => f32::INFINITY,
        }
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        match self.kind {
            BodyKind::Dynamic { mass } => 1.0 / mass,
            BodyKind::Static => 0.0,
        }
    }

    #[inline]
    pub fn inverse_inertia(&self) -> f32 {
        match self.kind {
            BodyKind::Dynamic { .. } => 1.0 / self.inertia(),
            BodyKind::Static => 0.0,
        }
    }

    /// Force accumulated so far this step
    pub fn accumulated_force(&self) -> Vector2D {
        self.forces
    }

    pub fn accumulated_torque(&self) -> f32 {
        self.torque
    }

    pub fn set_position(&mut self, position: Vector2D) {
        if self.is_static() {
            log::debug!("ignoring set_position on a static body");
            return;
        }
        self.position = position;
    }

    pub fn set_angle(&mut self, degrees: f32) {
        if self.is_static() {
            log::debug!("ignoring set_angle on a static body");
            return;
        }
        self.angle = degrees;
    }

    pub fn set_velocity(&mut self, velocity: Vector2D) {
        if self.is_static() {
            log::debug!("ignoring set_velocity on a static body");
            return;
        }
        self.velocity = velocity;
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: f32) {
        if self.is_static() {
            log::debug!("ignoring set_angular_velocity on a static body");
            return;
        }
        self.angular_velocity = angular_velocity;
    }

    /// Apply `force` at `local_offset` from the centre.
    ///
    /// Offsets outside the rectangle's half extents are ignored and `false`
    /// is returned. Otherwise the force is accumulated along with the torque
    /// `offset × rotate(force, angle)`.
    pub fn apply_force(&mut self, force: Vector2D, local_offset: Vector2D) -> bool {
        if local_offset.x.abs() > self.width / 2.0 || local_offset.y.abs() > self.height / 2.0 {
            return false;
        }
        self.forces += force;
        self.torque += local_offset.cross(force.rotate(self.angle));
        true
    }

    /// Semi-implicit Euler step, then clear the accumulators
    pub fn integrate(&mut self, dt: f32) {
        if !self.is_static() {
            self.velocity += self.forces * self.inverse_mass() * dt;
            self.position += self.velocity * dt;
            self.angular_velocity += self.torque * self.inverse_inertia() * dt;
            self.angle += self.angular_velocity * dt;
        }
        self.forces = Vector2D::ZERO;
        self.torque = 0.0;
    }

    /// Corners in winding order, rotated by `-angle`
    pub fn vertices(&self) -> [Vector2D; 4] {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        [
            Vector2D::new(-hw, -hh),
            Vector2D::new(hw, -hh),
            Vector2D::new(hw, hh),
            Vector2D::new(-hw, hh),
        ]
        .map(|corner| self.position + corner.rotate(-self.angle))
    }

    /// Edge vectors rotated by `+angle`
    ///
    /// The opposite sign to `vertices` is intentional; the SAT axes are the
    /// orthogonals of these edges.
    pub fn edges(&self) -> [Vector2D; 4] {
        [
            Vector2D::new(self.width, 0.0),
            Vector2D::new(0.0, self.height),
            Vector2D::new(-self.width, 0.0),
            Vector2D::new(0.0, -self.height),
        ]
        .map(|edge| edge.rotate(self.angle))
    }

    /// Positional correction (no-op for static bodies)
    pub(crate) fn translate(&mut self, delta: Vector2D) {
        if !self.is_static() {
            self.position += delta;
        }
    }

    /// Instantaneous change in linear and angular velocity, scaled by the
    /// inverse mass/inertia. No-op for static bodies.
    pub(crate) fn apply_linear_impulse(&mut self, impulse: Vector2D) {
        if !self.is_static() {
            self.velocity += impulse * self.inverse_mass();
        }
    }

    pub(crate) fn apply_angular_impulse(&mut self, angular_impulse: f32) {
        if !self.is_static() {
            self.angular_velocity += angular_impulse * self.inverse_inertia();
        }
    }
}
