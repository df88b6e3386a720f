//! Boundary to the rigid-body engine.
//!
//! The vehicle model only talks to the engine through [`RigidBodyWorld`],
//! which speaks in `glam` types and opaque [`BodyHandle`]s. No engine types
//! leak into the model and no model types leak into the engine.

mod avian;
#[cfg(test)]
pub(crate) mod mock;

use std::fmt;

use glam::Vec2;

use crate::error::Result;

pub use avian::AvianWorld;

/// Opaque handle to a body owned by a [`RigidBodyWorld`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) u32);

impl BodyHandle {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a body moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    Static,
    Dynamic,
}

/// Parameters for creating a body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec2,
    pub angle: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Enable continuous collision detection for fast movers.
    pub bullet: bool,
}

impl BodyDesc {
    /// An undamped dynamic body.
    pub fn dynamic(position: Vec2, angle: f32) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position,
            angle,
            linear_damping: 0.0,
            angular_damping: 0.0,
            bullet: false,
        }
    }

    /// A static body.
    pub fn fixed(position: Vec2, angle: f32) -> Self {
        Self {
            kind: BodyKind::Static,
            ..Self::dynamic(position, angle)
        }
    }

    #[must_use]
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    #[must_use]
    pub fn with_bullet(mut self, bullet: bool) -> Self {
        self.bullet = bullet;
        self
    }
}

/// An axis-aligned (in body space) box collision shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxFixture {
    pub half_extents: Vec2,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub sensor: bool,
}

impl BoxFixture {
    /// Solid box with density 1, friction 0.2 and no restitution.
    pub fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            half_extents: Vec2::new(half_width, half_height),
            density: 1.0,
            friction: 0.2,
            restitution: 0.0,
            sensor: false,
        }
    }

    #[must_use]
    pub fn with_material(mut self, friction: f32, restitution: f32) -> Self {
        self.friction = friction;
        self.restitution = restitution;
        self
    }
}

/// A constraint between two bodies. Anchors are body-local points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JointDesc {
    /// Shared anchor, free relative rotation, no motor.
    Revolute {
        body_a: BodyHandle,
        body_b: BodyHandle,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
    },
    /// Relative translation along `local_axis` of `body_a` within `[lower, upper]`.
    Prismatic {
        body_a: BodyHandle,
        body_b: BodyHandle,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
        local_axis: Vec2,
        lower: f32,
        upper: f32,
    },
}

impl JointDesc {
    pub fn bodies(&self) -> (BodyHandle, BodyHandle) {
        match *self {
            JointDesc::Revolute { body_a, body_b, .. }
            | JointDesc::Prismatic { body_a, body_b, .. } => (body_a, body_b),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            JointDesc::Revolute { .. } => "revolute joint",
            JointDesc::Prismatic { .. } => "prismatic joint",
        }
    }
}

/// Solver iteration counts for one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolverIterations {
    pub velocity: u32,
    pub position: u32,
}

/// Capabilities the vehicle model needs from a 2D rigid-body engine.
///
/// Query methods must only be called with handles this world issued; they
/// panic otherwise. Construction methods return errors instead.
pub trait RigidBodyWorld {
    /// Create a body with no fixtures.
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    /// Attach a box collision shape to `body`.
    fn attach_box(&mut self, body: BodyHandle, fixture: &BoxFixture) -> Result<()>;

    /// Create a joint between two existing bodies.
    fn create_joint(&mut self, joint: &JointDesc) -> Result<()>;

    /// Accumulate a force applied at a world-space point.
    fn apply_force(&mut self, body: BodyHandle, force: Vec2, world_point: Vec2);

    /// Set the absolute orientation of `body`.
    fn set_angle(&mut self, body: BodyHandle, angle: f32);

    /// Advance the world by `dt` seconds.
    fn step(&mut self, dt: f32, iterations: SolverIterations);

    /// Drop all accumulated forces.
    fn clear_forces(&mut self);

    /// World-space center of mass.
    fn world_center(&self, body: BodyHandle) -> Vec2;

    /// Orientation in radians. Continuous across full turns.
    fn angle(&self, body: BodyHandle) -> f32;

    /// Linear velocity of the center of mass.
    fn linear_velocity(&self, body: BodyHandle) -> Vec2;

    /// Angular velocity in radians per second.
    fn angular_velocity(&self, body: BodyHandle) -> f32;

    /// Transform a body-local point to world space.
    fn world_point(&self, body: BodyHandle, local_point: Vec2) -> Vec2 {
        self.world_center(body) + self.world_vector(body, local_point)
    }

    /// Rotate a body-local vector to world space.
    fn world_vector(&self, body: BodyHandle, local_vector: Vec2) -> Vec2 {
        Vec2::from_angle(self.angle(body)).rotate(local_vector)
    }

    /// World-space velocity of the material point at `local_point`.
    fn linear_velocity_from_local_point(&self, body: BodyHandle, local_point: Vec2) -> Vec2 {
        let offset = self.world_vector(body, local_point);
        let omega = self.angular_velocity(body);
        self.linear_velocity(body) + Vec2::new(-omega * offset.y, omega * offset.x)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::mock::MockWorld;
    use super::*;

    #[test]
    fn test_local_transforms() {
        let mut world = MockWorld::default();
        let body = world.create_body(&BodyDesc::dynamic(Vec2::new(1.0, 2.0), FRAC_PI_2));

        let p = world.world_point(body, Vec2::new(1.0, 0.0));
        assert!((p - Vec2::new(1.0, 3.0)).length() < 1e-5);

        let v = world.world_vector(body, Vec2::new(0.0, 1.0));
        assert!((v - Vec2::new(-1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_velocity_at_point_includes_rotation() {
        let mut world = MockWorld::default();
        let body = world.create_body(&BodyDesc::dynamic(Vec2::ZERO, 0.0));
        world.set_velocity(body, Vec2::new(0.0, -2.0), 1.0);

        // Spinning counter-clockwise, a point on +X moves toward +Y.
        let v = world.linear_velocity_from_local_point(body, Vec2::new(1.0, 0.0));
        assert!((v - Vec2::new(0.0, -1.0)).length() < 1e-5);
    }
}
