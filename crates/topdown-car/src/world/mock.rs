//! In-memory world that records every call, for control-law tests.

use glam::Vec2;

use super::{
    BodyDesc, BodyHandle, BodyKind, BoxFixture, JointDesc, RigidBodyWorld, SolverIterations,
};
use crate::{
    error::{Error, Result},
    vehicle::core::{box_inertia, box_mass},
};

#[derive(Clone, Debug)]
pub struct MockBody {
    pub desc: BodyDesc,
    pub position: Vec2,
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub fixtures: Vec<BoxFixture>,
    pub mass: f32,
    pub inertia: f32,
    pub force: Vec2,
    pub torque: f32,
}

/// A force application as seen by the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceCall {
    pub body: BodyHandle,
    pub force: Vec2,
    pub point: Vec2,
}

#[derive(Debug, Default)]
pub struct MockWorld {
    pub bodies: Vec<MockBody>,
    pub joints: Vec<JointDesc>,
    pub forces: Vec<ForceCall>,
    pub angle_sets: Vec<(BodyHandle, f32)>,
    pub steps: Vec<(f32, SolverIterations)>,
    pub clears: usize,
}

impl MockWorld {
    pub fn body(&self, handle: BodyHandle) -> &MockBody {
        &self.bodies[handle.index()]
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, linear: Vec2, angular: f32) {
        let body = &mut self.bodies[handle.index()];
        body.linear_velocity = linear;
        body.angular_velocity = angular;
    }

    /// Forget recorded calls, keeping world state.
    pub fn reset_log(&mut self) {
        self.forces.clear();
        self.angle_sets.clear();
        self.steps.clear();
        self.clears = 0;
    }

    pub fn forces_on(&self, handle: BodyHandle) -> Vec<ForceCall> {
        self.forces
            .iter()
            .filter(|call| call.body == handle)
            .copied()
            .collect()
    }

    fn check(&self, handle: BodyHandle) -> Result<()> {
        if handle.index() < self.bodies.len() {
            Ok(())
        } else {
            Err(Error::UnknownBody(handle))
        }
    }
}

impl RigidBodyWorld for MockWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle(u32::try_from(self.bodies.len()).unwrap());
        self.bodies.push(MockBody {
            desc: *desc,
            position: desc.position,
            angle: desc.angle,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            fixtures: Vec::new(),
            mass: 0.0,
            inertia: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
        });
        handle
    }

    fn attach_box(&mut self, body: BodyHandle, fixture: &BoxFixture) -> Result<()> {
        self.check(body)?;
        let record = &mut self.bodies[body.index()];
        let mass = box_mass(fixture.density, fixture.half_extents);
        record.mass += mass;
        record.inertia += box_inertia(mass, fixture.half_extents);
        record.fixtures.push(*fixture);
        Ok(())
    }

    fn create_joint(&mut self, joint: &JointDesc) -> Result<()> {
        let (a, b) = joint.bodies();
        self.check(a)?;
        self.check(b)?;
        self.joints.push(*joint);
        Ok(())
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2, world_point: Vec2) {
        self.forces.push(ForceCall {
            body,
            force,
            point: world_point,
        });
        let record = &mut self.bodies[body.index()];
        let offset = world_point - record.position;
        record.force += force;
        record.torque += offset.perp_dot(force);
    }

    fn set_angle(&mut self, body: BodyHandle, angle: f32) {
        self.angle_sets.push((body, angle));
        self.bodies[body.index()].angle = angle;
    }

    fn step(&mut self, dt: f32, iterations: SolverIterations) {
        self.steps.push((dt, iterations));
        for body in &mut self.bodies {
            if body.desc.kind == BodyKind::Static || body.mass <= 0.0 {
                continue;
            }
            body.linear_velocity += body.force / body.mass * dt;
            body.angular_velocity += body.torque / body.inertia * dt;
            body.position += body.linear_velocity * dt;
            body.angle += body.angular_velocity * dt;
        }
    }

    fn clear_forces(&mut self) {
        self.clears += 1;
        for body in &mut self.bodies {
            body.force = Vec2::ZERO;
            body.torque = 0.0;
        }
    }

    fn world_center(&self, body: BodyHandle) -> Vec2 {
        self.body(body).position
    }

    fn angle(&self, body: BodyHandle) -> f32 {
        self.body(body).angle
    }

    fn linear_velocity(&self, body: BodyHandle) -> Vec2 {
        self.body(body).linear_velocity
    }

    fn angular_velocity(&self, body: BodyHandle) -> f32 {
        self.body(body).angular_velocity
    }
}
