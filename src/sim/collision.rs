//! Collision detection for rotating rectangles
//!
//! Narrow phase only: a Separating Axis Theorem test between two bodies,
//! plus the contact-edge helpers the world uses to find a contact point for
//! the angular part of the impulse.

use serde::{Deserialize, Serialize};

use super::body::RigidBody;
use super::vector::Vector2D;
use crate::error::Result;

/// Result of a collision check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Whether the bodies overlap
    pub hit: bool,
    /// Minimum-translation axis (unit length, not oriented toward either body)
    pub normal: Vector2D,
    /// Penetration depth along `normal`
    pub depth: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vector2D::ZERO,
            depth: 0.0,
        }
    }
}

/// A line segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Vector2D,
    pub end: Vector2D,
}

impl Segment {
    pub fn new(start: Vector2D, end: Vector2D) -> Self {
        Self { start, end }
    }
}

/// Project points onto an axis, returning (min, max)
fn project(points: &[Vector2D; 4], axis: Vector2D) -> (f32, f32) {
    points.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
        let d = p.dot(axis);
        (lo.min(d), hi.max(d))
    })
}

impl RigidBody {
    /// SAT overlap test against `other`
    ///
    /// Tests the orthogonals of all eight edges (no deduplication). Returns a
    /// miss as soon as one axis separates the bodies, otherwise the axis of
    /// least overlap and that overlap as the depth.
    pub fn collide(&self, other: &RigidBody) -> Result<CollisionResult> {
        // Bounding-circle rejection
        let reach = self.width().max(self.height()) + other.width().max(other.height());
        if (self.position - other.position).length() > reach {
            return Ok(CollisionResult::miss());
        }

        let ours = self.vertices();
        let theirs = other.vertices();

        let mut depth = f32::INFINITY;
        let mut normal = Vector2D::ZERO;
        for edge in self.edges().into_iter().chain(other.edges()) {
            let axis = edge.orthogonal().normalize()?;
            let (min_a, max_a) = project(&ours, axis);
            let (min_b, max_b) = project(&theirs, axis);
            let overlap = max_a.min(max_b) - min_a.max(min_b);
            if overlap <= 0.0 {
                return Ok(CollisionResult::miss());
            }
            if overlap < depth {
                depth = overlap;
                normal = axis;
            }
        }

        Ok(CollisionResult {
            hit: true,
            normal,
            depth,
        })
    }

    /// Edge of this body facing along `normal`
    ///
    /// Picks the support vertex (furthest along `normal`), then pairs it with
    /// whichever neighbour projects further along `normal`. The result is the
    /// edge closest to perpendicular to the normal.
    pub fn collision_edge(&self, normal: Vector2D) -> Segment {
        let vertices = self.vertices();
        let n = vertices.len();

        let mut best = 0;
        let mut max_projection = vertices[0].dot(normal);
        for (i, vertex) in vertices.iter().enumerate().skip(1) {
            let projection = vertex.dot(normal);
            if projection > max_projection {
                max_projection = projection;
                best = i;
            }
        }

        let support = vertices[best];
        let left = vertices[(best + n - 1) % n];
        let right = vertices[(best + 1) % n];
        if right.dot(normal) > left.dot(normal) {
            Segment::new(right, support)
        } else {
            Segment::new(support, left)
        }
    }
}

/// Intersection of the infinite lines through two segments
///
/// `None` when the lines are parallel.
pub fn line_intersection(a: Segment, b: Segment) -> Option<Vector2D> {
    let xdiff = Vector2D::new(a.start.x - a.end.x, b.start.x - b.end.x);
    let ydiff = Vector2D::new(a.start.y - a.end.y, b.start.y - b.end.y);

    let div = xdiff.cross(ydiff);
    if div == 0.0 {
        return None;
    }

    let d = Vector2D::new(a.start.cross(a.end), b.start.cross(b.end));
    Some(Vector2D::new(d.cross(xdiff) / div, d.cross(ydiff) / div))
}
