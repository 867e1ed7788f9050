//! The physics world: body ownership and the per-step update
//!
//! Each `update` walks the bodies in insertion order. Body `i` gets gravity,
//! is tested and resolved against every later body `j > i`, and is then
//! integrated straight away, before body `i + 1` runs its own pair loop.
//! Results therefore depend on insertion order when several bodies touch.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::body::{BodyId, RigidBody};
use super::collision::line_intersection;
use super::vector::Vector2D;
use crate::consts::DEFAULT_GRAVITY;
use crate::error::{PhysicsError, Result};

/// A set of bodies simulated together
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawWorld")]
pub struct PhysicsWorld {
    /// Downward acceleration (+y is down)
    pub gravity: f32,
    /// Bodies in insertion order
    bodies: Vec<(BodyId, RigidBody)>,
    next_id: u32,
}

/// Serialized form of a world, checked on the way in
#[derive(Deserialize)]
struct RawWorld {
    gravity: f32,
    bodies: Vec<(BodyId, RigidBody)>,
    next_id: u32,
}

impl TryFrom<RawWorld> for PhysicsWorld {
    type Error = PhysicsError;

    fn try_from(raw: RawWorld) -> Result<Self> {
        let mut seen = HashSet::with_capacity(raw.bodies.len());
        for (id, _) in &raw.bodies {
            if !seen.insert(*id) {
                return Err(PhysicsError::DuplicateBody(*id));
            }
        }
        // Never hand out a handle that is already taken
        let next_id = raw
            .bodies
            .iter()
            .map(|(id, _)| id.0.saturating_add(1))
            .fold(raw.next_id.max(1), u32::max);
        Ok(Self {
            gravity: raw.gravity,
            bodies: raw.bodies,
            next_id,
        })
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(DEFAULT_GRAVITY)
    }
}

impl PhysicsWorld {
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity,
            bodies: Vec::new(),
            next_id: 1,
        }
    }

    /// Take ownership of a body and return its handle
    pub fn add(&mut self, body: RigidBody) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        log::debug!(
            "add body {} ({}x{} at {}, static={})",
            id,
            body.width(),
            body.height(),
            body.position(),
            body.is_static()
        );
        self.bodies.push((id, body));
        id
    }

    /// Add several bodies, returning their handles in order
    pub fn extend<I>(&mut self, bodies: I) -> Vec<BodyId>
    where
        I: IntoIterator<Item = RigidBody>,
    {
        bodies.into_iter().map(|body| self.add(body)).collect()
    }

    /// Remove a body and hand it back
    ///
    /// Removing a body that is not in the world is an error.
    pub fn remove(&mut self, id: BodyId) -> Result<RigidBody> {
        let index = self
            .index_of(id)
            .ok_or(PhysicsError::UnknownBody(id))?;
        let (_, body) = self.bodies.remove(index);
        log::debug!("remove body {}", id);
        Ok(body)
    }

    /// Keep only the bodies matching `keep`; returns the ids removed
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<BodyId>
    where
        F: FnMut(BodyId, &RigidBody) -> bool,
    {
        let mut removed = Vec::new();
        self.bodies.retain(|(id, body)| {
            let kept = keep(*id, body);
            if !kept {
                removed.push(*id);
            }
            kept
        });
        if !removed.is_empty() {
            log::debug!("culled {} bodies", removed.len());
        }
        removed
    }

    pub fn get(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies
            .iter()
            .find_map(|(bid, body)| (*bid == id).then_some(body))
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.bodies
            .iter_mut()
            .find_map(|(bid, body)| (*bid == id).then_some(body))
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.index_of(id).is_some()
    }

    /// Bodies in insertion order
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &RigidBody)> {
        self.bodies.iter().map(|(id, body)| (*id, body))
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Number of dynamic (non-static) bodies
    pub fn active_count(&self) -> usize {
        self.bodies.iter().filter(|(_, b)| !b.is_static()).count()
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.iter().position(|(bid, _)| *bid == id)
    }

    /// Advance the simulation by `dt` seconds
    pub fn update(&mut self, dt: f32) -> Result<()> {
        for i in 0..self.bodies.len() {
            let (head, tail) = self.bodies.split_at_mut(i + 1);
            let (id, body) = &mut head[i];

            if !body.is_static() {
                let weight = Vector2D::new(0.0, body.mass() * self.gravity);
                body.apply_force(weight, Vector2D::ZERO);
            }

            for (other_id, other) in tail.iter_mut() {
                if resolve_pair(body, other)? {
                    log::trace!("contact {} <-> {}", id, other_id);
                }
            }

            body.integrate(dt);
        }
        Ok(())
    }
}

/// Detect and resolve one pair. Returns whether they were in contact.
fn resolve_pair(body: &mut RigidBody, other: &mut RigidBody) -> Result<bool> {
    // Nothing can move; the impulse denominator would be zero too
    if body.is_static() && other.is_static() {
        return Ok(false);
    }

    let collision = body.collide(other)?;
    if !collision.hit {
        return Ok(false);
    }

    let normal = collision.normal.normalize()?;
    let relative_velocity = body.velocity - other.velocity;
    let inverse_mass_sum = body.inverse_mass() + other.inverse_mass();
    // Only the first body's restitution takes part
    let j = -(1.0 + body.restitution()) * relative_velocity.dot(normal)
        / normal.dot(normal * inverse_mass_sum);

    // Separate along the normal, away from each other
    let direction = body.position - other.position;
    let sign = 1.0f32.copysign(normal.dot(direction));
    let correction = normal * (collision.depth * sign);
    body.translate(correction);
    other.translate(-correction);

    let impulse = normal * j;
    body.apply_linear_impulse(impulse);
    other.apply_linear_impulse(-impulse);

    let contact = line_intersection(
        body.collision_edge(-direction),
        other.collision_edge(direction),
    );
    if let Some(point) = contact {
        body.apply_angular_impulse((point - body.position).cross(impulse));
        other.apply_angular_impulse(-(point - other.position).cross(impulse));
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn overlap_depth(world: &PhysicsWorld, a: BodyId, b: BodyId) -> f32 {
        let result = world
            .get(a)
            .unwrap()
            .collide(world.get(b).unwrap())
            .unwrap();
        if result.hit { result.depth } else { 0.0 }
    }

    #[test]
    fn test_gravity_single_step() {
        let mut world = PhysicsWorld::new(200.0);
        let id = world.add(RigidBody::new(10.0, 10.0, 100.0, 100.0).unwrap());
        world.update(1.0 / 60.0).unwrap();

        let body = world.get(id).unwrap();
        assert!((body.velocity().y - 200.0 / 60.0).abs() < 1e-4);
        assert_eq!(body.velocity().x, 0.0);
    }

    #[test]
    fn test_gravity_off() {
        let mut world = PhysicsWorld::new(200.0);
        let id = world.add(RigidBody::new(10.0, 10.0, 100.0, 100.0).unwrap());
        world.gravity = 0.0;
        world.update(1.0 / 60.0).unwrap();

        let body = world.get(id).unwrap();
        assert_eq!(body.velocity(), Vector2D::ZERO);
        assert_eq!(body.position(), Vector2D::new(100.0, 100.0));
    }

    #[test]
    fn test_remove_absent_body_is_error() {
        let mut world = PhysicsWorld::default();
        let id = world.add(RigidBody::new(1.0, 1.0, 0.0, 0.0).unwrap());
        assert!(world.remove(id).is_ok());
        assert_eq!(world.remove(id).unwrap_err(), PhysicsError::UnknownBody(id));
        assert!(world.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut world = PhysicsWorld::default();
        let ids = world.extend((0..3).map(|i| RigidBody::new(1.0, 1.0, i as f32 * 10.0, 0.0).unwrap()));
        world.remove(ids[1]).unwrap();
        let new_id = world.add(RigidBody::new(1.0, 1.0, 50.0, 0.0).unwrap());
        assert!(!ids.contains(&new_id));
        assert_eq!(world.len(), 3);
        assert!(!world.contains(ids[1]));
    }

    #[test]
    fn test_overlap_shrinks_after_step() {
        let mut world = PhysicsWorld::new(0.0);
        let a = world.add(RigidBody::new(10.0, 10.0, 0.0, 0.0).unwrap());
        let b = world.add(RigidBody::new(10.0, 10.0, 6.0, 0.0).unwrap());

        let mut previous = overlap_depth(&world, a, b);
        assert!(previous > 0.0);
        for _ in 0..5 {
            world.update(SIM_DT).unwrap();
            let depth = overlap_depth(&world, a, b);
            assert!(depth <= previous);
            previous = depth;
        }
        assert_eq!(previous, 0.0);

        // Pushed apart along x, in opposite directions
        assert!(world.get(a).unwrap().position().x < 0.0);
        assert!(world.get(b).unwrap().position().x > 6.0);
    }

    #[test]
    fn test_inelastic_hit_on_static_does_not_gain_speed() {
        let mut world = PhysicsWorld::new(0.0);
        let ball = world.add(
            RigidBody::new(10.0, 10.0, 0.0, 0.0)
                .unwrap()
                .with_restitution(0.0)
                .with_velocity(Vector2D::new(0.0, 50.0)),
        );
        let floor = world.add(RigidBody::new_static(100.0, 10.0, 0.0, 9.0).unwrap());

        let before = world.get(ball).unwrap().velocity().length();
        world.update(SIM_DT).unwrap();
        let after = world.get(ball).unwrap().velocity().length();
        assert!(after <= before + 1e-4);
        // Normal component removed entirely
        assert!(world.get(ball).unwrap().velocity().y.abs() < 1e-3);
        assert_eq!(world.get(floor).unwrap().position(), Vector2D::new(0.0, 9.0));
    }

    #[test]
    fn test_angled_hit_keeps_speed_bounded() {
        let mut world = PhysicsWorld::new(0.0);
        let ball = world.add(
            RigidBody::new(10.0, 10.0, 0.0, 0.0)
                .unwrap()
                .with_angle(20.0)
                .with_restitution(0.0)
                .with_velocity(Vector2D::new(30.0, 40.0)),
        );
        world.add(RigidBody::new_static(200.0, 20.0, 0.0, 14.0).unwrap());

        world.update(SIM_DT).unwrap();
        let body = world.get(ball).unwrap();
        assert!(body.velocity().length() <= 50.0 + 1e-3);
    }

    #[test]
    fn test_static_body_is_immovable() {
        let mut world = PhysicsWorld::new(200.0);
        let wall = world.add(
            RigidBody::new(20.0, 20.0, 0.0, 0.0)
                .unwrap()
                .with_angle(10.0)
                .with_mass(f32::INFINITY)
                .unwrap(),
        );
        // Heavy fast body driven into the wall from both orderings
        world.add(
            RigidBody::new(20.0, 20.0, 15.0, 5.0)
                .unwrap()
                .with_mass(1e6)
                .unwrap()
                .with_velocity(Vector2D::new(-500.0, -100.0)),
        );
        world.get_mut(wall).unwrap().apply_force(Vector2D::new(1e9, 1e9), Vector2D::new(5.0, 5.0));
        world.add(
            RigidBody::new(20.0, 20.0, -15.0, 0.0)
                .unwrap()
                .with_velocity(Vector2D::new(300.0, 0.0)),
        );

        for _ in 0..30 {
            world.update(SIM_DT).unwrap();
            let body = world.get(wall).unwrap();
            assert_eq!(body.position(), Vector2D::ZERO);
            assert_eq!(body.angle(), 10.0);
            assert_eq!(body.velocity(), Vector2D::ZERO);
            assert_eq!(body.angular_velocity(), 0.0);
        }
    }

    #[test]
    fn test_static_pairs_are_skipped() {
        let mut world = PhysicsWorld::new(200.0);
        let a = world.add(RigidBody::new_static(10.0, 10.0, 0.0, 0.0).unwrap());
        let b = world.add(RigidBody::new_static(10.0, 10.0, 5.0, 0.0).unwrap());
        world.update(SIM_DT).unwrap();
        assert_eq!(world.get(a).unwrap().position(), Vector2D::ZERO);
        assert_eq!(world.get(b).unwrap().position(), Vector2D::new(5.0, 0.0));
    }

    #[test]
    fn test_falling_body_lands_on_floor() {
        let mut world = PhysicsWorld::new(200.0);
        let floor = world.add(RigidBody::new_static(400.0, 20.0, 0.0, 100.0).unwrap());
        let crate_id = world.add(RigidBody::new(20.0, 20.0, 0.0, 0.0).unwrap().with_restitution(0.0));

        for _ in 0..240 {
            world.update(SIM_DT).unwrap();
        }

        let body = world.get(crate_id).unwrap();
        let floor_top = world.get(floor).unwrap().position().y - 10.0;
        // Resting on (or just above) the floor rather than falling through
        assert!(body.position().y < floor_top);
        assert!(body.position().y > floor_top - 20.0);
    }

    #[test]
    fn test_active_count_and_retain() {
        let mut world = PhysicsWorld::new(0.0);
        world.add(RigidBody::new_static(10.0, 10.0, 0.0, 0.0).unwrap());
        let inside = world.add(RigidBody::new(1.0, 1.0, 50.0, 50.0).unwrap());
        let outside = world.add(RigidBody::new(1.0, 1.0, -50.0, 50.0).unwrap());
        assert_eq!(world.active_count(), 2);

        let removed = world.retain(|_, body| body.position().x >= 0.0);
        assert_eq!(removed, vec![outside]);
        assert!(world.contains(inside));
        assert_eq!(world.active_count(), 1);
    }

    #[test]
    fn test_separated_bodies_fall_together() {
        let mut world = PhysicsWorld::new(100.0);
        let a = world.add(RigidBody::new(1.0, 1.0, 0.0, 0.0).unwrap());
        let b = world.add(RigidBody::new(1.0, 1.0, 10.0, 0.0).unwrap());
        world.update(0.1).unwrap();
        let va = world.get(a).unwrap().velocity();
        let vb = world.get(b).unwrap().velocity();
        assert_eq!(va, vb);
        assert!((va.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut world = PhysicsWorld::new(9.8);
        world.add(RigidBody::new(2.0, 3.0, 1.0, 1.0).unwrap().with_angle(12.0));
        world.add(RigidBody::new_static(5.0, 5.0, 20.0, 20.0).unwrap());
        let json = serde_json::to_string(&world).unwrap();
        let back: PhysicsWorld = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.active_count(), 1);
        assert_eq!(back.gravity, 9.8);
    }

    #[test]
    fn test_snapshot_with_stale_next_id_keeps_ids_unique() {
        let json = r#"{"gravity":0.0,"next_id":1,"bodies":[
            [4,{"width":1.0,"height":1.0,"position":{"x":0.0,"y":0.0},"angle":0.0,
                "velocity":{"x":0.0,"y":0.0},"angular_velocity":0.0,
                "kind":{"kind":"dynamic","mass":1.0},"restitution":0.5}]]}"#;
        let mut world: PhysicsWorld = serde_json::from_str(json).unwrap();
        let old = world.bodies().next().unwrap().0;
        let new = world.add(RigidBody::new(1.0, 1.0, 5.0, 5.0).unwrap());
        assert_ne!(old, new);
        assert_eq!(new, BodyId(5));
        world.remove(new).unwrap();
        assert!(world.contains(old));
    }

    #[test]
    fn test_snapshot_with_duplicate_ids_is_rejected() {
        let body = r#"{"width":1.0,"height":1.0,"position":{"x":0.0,"y":0.0},"angle":0.0,
            "velocity":{"x":0.0,"y":0.0},"angular_velocity":0.0,
            "kind":{"kind":"static"},"restitution":0.5}"#;
        let json = format!(r#"{{"gravity":0.0,"next_id":3,"bodies":[[2,{body}],[2,{body}]]}}"#);
        let err = serde_json::from_str::<PhysicsWorld>(&json).unwrap_err();
        assert!(err.to_string().contains("#2 appears more than once"));
    }

    #[test]
    fn test_snapshot_with_massless_body_is_rejected() {
        let json = r#"{"gravity":9.8,"next_id":2,"bodies":[
            [1,{"width":1.0,"height":1.0,"position":{"x":0.0,"y":0.0},"angle":0.0,
                "velocity":{"x":0.0,"y":0.0},"angular_velocity":0.0,
                "kind":{"kind":"dynamic","mass":0.0},"restitution":0.5}]]}"#;
        assert!(serde_json::from_str::<PhysicsWorld>(json).is_err());
    }

    #[test]
    fn test_off_centre_hit_spins_both_bodies() {
        let mut world = PhysicsWorld::new(0.0);
        let block = RigidBody::new(10.0, 10.0, 0.0, 0.0)
            .unwrap()
            .with_angle(30.0)
            .with_velocity(Vector2D::new(0.0, 40.0));
        let slab = RigidBody::new(60.0, 10.0, 3.0, 11.0).unwrap();

        // Work the expected spin out by hand from the pre-step state
        let hit = block.collide(&slab).unwrap();
        assert!(hit.hit);
        let n = hit.normal.normalize().unwrap();
        let j = -(1.0 + block.restitution()) * (block.velocity() - slab.velocity()).dot(n)
            / (block.inverse_mass() + slab.inverse_mass());
        let d = block.position() - slab.position();
        let shift = n * (hit.depth * 1.0f32.copysign(n.dot(d)));
        let mut moved_block = block.clone();
        let mut moved_slab = slab.clone();
        moved_block.set_position(block.position() + shift);
        moved_slab.set_position(slab.position() - shift);
        let contact = line_intersection(
            moved_block.collision_edge(-d),
            moved_slab.collision_edge(d),
        )
        .unwrap();
        let impulse = n * j;
        let expected_block =
            (contact - moved_block.position()).cross(impulse) * block.inverse_inertia();
        let expected_slab =
            -(contact - moved_slab.position()).cross(impulse) * slab.inverse_inertia();

        let block_id = world.add(block);
        let slab_id = world.add(slab);
        world.update(SIM_DT).unwrap();

        let spin_block = world.get(block_id).unwrap().angular_velocity();
        let spin_slab = world.get(slab_id).unwrap().angular_velocity();
        // The two bodies pick up spin of opposite sign
        assert!(spin_block > 0.0, "block spin {spin_block}");
        assert!(spin_slab < 0.0, "slab spin {spin_slab}");
        assert!((spin_block - expected_block).abs() <= 1e-3 * expected_block.abs());
        assert!((spin_slab - expected_slab).abs() <= 1e-3 * expected_slab.abs());
        assert!((spin_block - 83.31).abs() < 1.0);
        assert!((spin_slab + 0.834).abs() < 0.01);
    }

    #[test]
    fn test_parallel_contact_edges_do_not_spin() {
        let mut world = PhysicsWorld::new(0.0);
        let block = world.add(
            RigidBody::new(10.0, 10.0, 20.0, 0.0)
                .unwrap()
                .with_velocity(Vector2D::new(0.0, 40.0)),
        );
        let slab = world.add(RigidBody::new(60.0, 10.0, 0.0, 9.0).unwrap());
        world.update(SIM_DT).unwrap();

        assert_ne!(world.get(block).unwrap().velocity(), Vector2D::new(0.0, 40.0));
        assert_eq!(world.get(block).unwrap().angular_velocity(), 0.0);
        assert_eq!(world.get(slab).unwrap().angular_velocity(), 0.0);
    }

    #[test]
    fn test_first_body_restitution_decides_the_bounce() {
        let bouncy = || {
            RigidBody::new(10.0, 10.0, 0.0, 0.0)
                .unwrap()
                .with_restitution(1.0)
                .with_velocity(Vector2D::new(10.0, 0.0))
        };
        let dead = || {
            RigidBody::new(10.0, 10.0, 9.0, 0.0)
                .unwrap()
                .with_restitution(0.0)
                .with_velocity(Vector2D::new(-10.0, 0.0))
        };

        let mut world = PhysicsWorld::new(0.0);
        let a = world.add(bouncy());
        let b = world.add(dead());
        world.update(SIM_DT).unwrap();
        assert!((world.get(a).unwrap().velocity().x + 10.0).abs() < 1e-3);
        assert!((world.get(b).unwrap().velocity().x - 10.0).abs() < 1e-3);

        let mut world = PhysicsWorld::new(0.0);
        let b = world.add(dead());
        let a = world.add(bouncy());
        world.update(SIM_DT).unwrap();
        assert!(world.get(a).unwrap().velocity().x.abs() < 1e-3);
        assert!(world.get(b).unwrap().velocity().x.abs() < 1e-3);
    }

    #[test]
    fn test_stack_result_depends_on_insertion_order() {
        let stack = |order: [f32; 3]| {
            let mut world = PhysicsWorld::new(0.0);
            let ids: Vec<BodyId> = order
                .iter()
                .map(|y| world.add(RigidBody::new(10.0, 10.0, 0.0, *y).unwrap()))
                .collect();
            world.update(SIM_DT).unwrap();
            ids.iter()
                .map(|id| world.get(*id).unwrap().position().y)
                .collect::<Vec<_>>()
        };
        let close = |got: &[f32], want: [f32; 3]| {
            got.iter().zip(want).all(|(g, w)| (g - w).abs() < 1e-4)
        };

        // Bottom-up: the middle box is pushed back by the top pair after
        // the bottom pair already moved it
        let forward = stack([0.0, 8.0, 16.0]);
        assert!(close(&forward, [-2.0, 6.0, 20.0]), "{forward:?}");

        let reverse = stack([16.0, 8.0, 0.0]);
        assert!(close(&reverse, [18.0, 10.0, -4.0]), "{reverse:?}");
    }
}
