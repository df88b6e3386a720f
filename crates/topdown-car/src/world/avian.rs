//! [`RigidBodyWorld`] on top of avian2d, hosted in a headless Bevy app.
//!
//! Each [`AvianWorld::step`] runs exactly one physics step: the fixed
//! timestep is set to `dt` and time is advanced manually by the same amount.
//! Forces are accumulated here and turned into velocity changes right before
//! the step.

use std::time::Duration;

use avian2d::prelude::*;
use bevy::{
    prelude::{
        App, AssetApp, AssetPlugin, ChildOf, Entity, Fixed, MinimalPlugins, Quat, Time, Transform,
        Virtual,
    },
    time::TimeUpdateStrategy,
    transform::TransformPlugin,
};
use glam::Vec2;
use tracing::debug;

use super::{
    BodyDesc, BodyHandle, BodyKind, BoxFixture, JointDesc, RigidBodyWorld, SolverIterations,
};
use crate::{
    error::{Error, Result},
    simulation::MIN_STEP_SECS,
    vehicle::core::{box_inertia, box_mass, unwrap_angle},
};

/// Physics length unit. Bodies here are a few meters across.
const LENGTH_UNIT: f32 = 1.0;

/// Bookkeeping for one body.
struct AvianBody {
    entity: Entity,
    kind: BodyKind,
    has_collider: bool,
    mass: f32,
    inertia: f32,
    force: Vec2,
    torque: f32,
    /// Last reported angle, unwrapped.
    angle: f32,
}

/// Zero-gravity avian2d world.
pub struct AvianWorld {
    app: App,
    bodies: Vec<AvianBody>,
}

impl AvianWorld {
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            TransformPlugin,
            AssetPlugin::default(),
            bevy::scene::ScenePlugin,
        ))
        .init_asset::<bevy::mesh::Mesh>()
        .add_plugins(PhysicsPlugins::default().with_length_unit(LENGTH_UNIT))
        .insert_resource(Gravity::ZERO);

        app.finish();
        app.cleanup();

        // Time starts counting on the first update, so burn it here.
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::ZERO));
        app.update();

        Self {
            app,
            bodies: Vec::new(),
        }
    }

    fn record(&self, handle: BodyHandle) -> Result<&AvianBody> {
        self.bodies
            .get(handle.index())
            .ok_or(Error::UnknownBody(handle))
    }

    fn position(&self, body: &AvianBody) -> Vec2 {
        self.app
            .world()
            .get::<Position>(body.entity)
            .map_or(Vec2::ZERO, |position| position.0)
    }

    fn rotation(&self, body: &AvianBody) -> f32 {
        self.app
            .world()
            .get::<Rotation>(body.entity)
            .map_or(0.0, |rotation| rotation.as_radians())
    }

    /// Turn accumulated forces into velocity changes over `dt`.
    fn integrate_forces(&mut self, dt: f32) {
        let world = self.app.world_mut();
        for body in &self.bodies {
            if body.kind == BodyKind::Static || body.mass <= 0.0 {
                continue;
            }
            if let Some(mut velocity) = world.get_mut::<LinearVelocity>(body.entity) {
                velocity.0 += body.force / body.mass * dt;
            }
            if body.inertia > 0.0
                && let Some(mut velocity) = world.get_mut::<AngularVelocity>(body.entity)
            {
                velocity.0 += body.torque / body.inertia * dt;
            }
        }
    }

    fn refresh_angles(&mut self) {
        let angles: Vec<f32> = self.bodies.iter().map(|body| self.rotation(body)).collect();
        for (body, wrapped) in self.bodies.iter_mut().zip(angles) {
            body.angle = unwrap_angle(body.angle, wrapped);
        }
    }
}

impl Default for AvianWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBodyWorld for AvianWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle(u32::try_from(self.bodies.len()).unwrap_or(u32::MAX));
        let rigid_body = match desc.kind {
            BodyKind::Static => RigidBody::Static,
            BodyKind::Dynamic => RigidBody::Dynamic,
        };

        let mut entity = self.app.world_mut().spawn((
            rigid_body,
            Position(desc.position),
            Rotation::radians(desc.angle),
            Transform::from_translation(desc.position.extend(0.0))
                .with_rotation(Quat::from_rotation_z(desc.angle)),
            LinearDamping(desc.linear_damping),
            AngularDamping(desc.angular_damping),
        ));
        if desc.kind == BodyKind::Dynamic {
            // Velocities are written directly, which does not wake bodies.
            entity.insert(SleepingDisabled);
        }
        if desc.bullet {
            entity.insert(SweptCcd::default());
        }

        self.bodies.push(AvianBody {
            entity: entity.id(),
            kind: desc.kind,
            has_collider: false,
            mass: 0.0,
            inertia: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            angle: desc.angle,
        });
        handle
    }

    fn attach_box(&mut self, body: BodyHandle, fixture: &BoxFixture) -> Result<()> {
        let record = self.record(body)?;
        let (entity, has_collider) = (record.entity, record.has_collider);

        let half = fixture.half_extents;
        if !(half.is_finite() && half.x > 0.0 && half.y > 0.0) {
            return Err(Error::InvalidConstraint {
                kind: "box fixture",
                detail: format!("half extents must be positive, got ({}, {})", half.x, half.y),
            });
        }

        let shape = (
            Collider::rectangle(half.x * 2.0, half.y * 2.0),
            ColliderDensity(fixture.density),
            Friction::new(fixture.friction),
            Restitution::new(fixture.restitution),
        );
        let world = self.app.world_mut();
        if has_collider {
            let mut child = world.spawn((shape, Transform::default(), ChildOf(entity)));
            if fixture.sensor {
                child.insert(Sensor);
            }
        } else {
            let mut owner = world.entity_mut(entity);
            owner.insert(shape);
            if fixture.sensor {
                owner.insert(Sensor);
            }
        }

        let record = &mut self.bodies[body.index()];
        record.has_collider = true;
        if !fixture.sensor {
            let mass = box_mass(fixture.density, half);
            record.mass += mass;
            record.inertia += box_inertia(mass, half);
        }
        Ok(())
    }

    fn create_joint(&mut self, joint: &JointDesc) -> Result<()> {
        let (a, b) = joint.bodies();
        let entity_a = self.record(a)?.entity;
        let entity_b = self.record(b)?.entity;

        match *joint {
            JointDesc::Revolute {
                local_anchor_a,
                local_anchor_b,
                ..
            } => {
                self.app.world_mut().spawn((
                    RevoluteJoint::new(entity_a, entity_b)
                        .with_local_anchor1(local_anchor_a)
                        .with_local_anchor2(local_anchor_b),
                    JointCollisionDisabled,
                ));
            }
            JointDesc::Prismatic {
                local_anchor_a,
                local_anchor_b,
                local_axis,
                lower,
                upper,
                ..
            } => {
                // Avian slides along the first body's local X axis.
                if !local_axis.normalize_or_zero().abs_diff_eq(Vec2::X, 1e-5) {
                    return Err(Error::InvalidConstraint {
                        kind: joint.kind(),
                        detail: format!(
                            "only the local X axis is supported, got ({}, {})",
                            local_axis.x, local_axis.y
                        ),
                    });
                }
                if !(lower.is_finite() && upper.is_finite() && lower <= upper) {
                    return Err(Error::InvalidConstraint {
                        kind: joint.kind(),
                        detail: format!("bad translation limits [{lower}, {upper}]"),
                    });
                }

                self.app.world_mut().spawn((
                    PrismaticJoint::new(entity_a, entity_b)
                        .with_local_anchor1(local_anchor_a)
                        .with_local_anchor2(local_anchor_b)
                        .with_limits(lower, upper),
                    JointCollisionDisabled,
                ));
            }
        }

        debug!("Created {} between {a} and {b}", joint.kind());
        Ok(())
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2, world_point: Vec2) {
        let center = self.world_center(body);
        let record = &mut self.bodies[body.index()];
        record.force += force;
        record.torque += (world_point - center).perp_dot(force);
    }

    fn set_angle(&mut self, body: BodyHandle, angle: f32) {
        let record = &mut self.bodies[body.index()];
        record.angle = angle;
        let entity = record.entity;

        let world = self.app.world_mut();
        if let Some(mut rotation) = world.get_mut::<Rotation>(entity) {
            *rotation = Rotation::radians(angle);
        }
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.rotation = Quat::from_rotation_z(angle);
        }
    }

    fn step(&mut self, dt: f32, iterations: SolverIterations) {
        // Joint solving breaks down on vanishingly short steps.
        if !(dt.is_finite() && dt >= MIN_STEP_SECS) {
            return;
        }
        let duration = Duration::from_secs_f32(dt);

        self.integrate_forces(dt);

        let world = self.app.world_mut();
        // Avian has no separate position pass; substeps play the role of
        // velocity iterations.
        world.insert_resource(SubstepCount(iterations.velocity.max(1)));
        world.resource_mut::<Time<Virtual>>().set_max_delta(duration);
        world.resource_mut::<Time<Fixed>>().set_timestep(duration);
        world.insert_resource(TimeUpdateStrategy::ManualDuration(duration));

        self.app.update();
        self.refresh_angles();
    }

    fn clear_forces(&mut self) {
        for body in &mut self.bodies {
            body.force = Vec2::ZERO;
            body.torque = 0.0;
        }
    }

    fn world_center(&self, body: BodyHandle) -> Vec2 {
        self.position(&self.bodies[body.index()])
    }

    fn angle(&self, body: BodyHandle) -> f32 {
        self.bodies[body.index()].angle
    }

    fn linear_velocity(&self, body: BodyHandle) -> Vec2 {
        self.app
            .world()
            .get::<LinearVelocity>(self.bodies[body.index()].entity)
            .map_or(Vec2::ZERO, |velocity| velocity.0)
    }

    fn angular_velocity(&self, body: BodyHandle) -> f32 {
        self.app
            .world()
            .get::<AngularVelocity>(self.bodies[body.index()].entity)
            .map_or(0.0, |velocity| velocity.0)
    }
}
