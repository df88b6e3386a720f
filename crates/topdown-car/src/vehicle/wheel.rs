//! A single wheel body constrained to the chassis.

use glam::Vec2;
use tracing::debug;

use super::core::{WHEEL_DRIVE_AXIS, WHEEL_GRIP_AXIS, grip_force};
use crate::{
    error::Result,
    spec::{WheelPosition, WheelSpec},
    world::{BodyDesc, BodyHandle, BoxFixture, JointDesc, RigidBodyWorld},
};

/// A wheel: its own dynamic body, jointed to the chassis.
#[derive(Clone, Debug)]
pub struct Wheel {
    position: WheelPosition,
    body: BodyHandle,
    chassis: BodyHandle,
    /// Anchor on the chassis, in chassis-local coordinates.
    offset: Vec2,
    powered: bool,
    steering: bool,
}

impl Wheel {
    /// Create the wheel body and its joint to `chassis`.
    ///
    /// Steering wheels get a revolute joint so their angle can be set freely.
    /// Fixed wheels get a prismatic joint with zero travel, which welds them.
    pub fn new(
        spec: &WheelSpec,
        chassis: BodyHandle,
        world: &mut impl RigidBodyWorld,
    ) -> Result<Self> {
        let offset = spec.placement.position;
        let world_position = world.world_point(chassis, offset);
        let body = world.create_body(&BodyDesc::dynamic(world_position, world.angle(chassis)));

        // The wheel's long side runs along its local X.
        world.attach_box(
            body,
            &BoxFixture::new(spec.placement.height / 2.0, spec.placement.width / 2.0),
        )?;

        let joint = if spec.steering {
            JointDesc::Revolute {
                body_a: chassis,
                body_b: body,
                local_anchor_a: offset,
                local_anchor_b: Vec2::ZERO,
            }
        } else {
            JointDesc::Prismatic {
                body_a: chassis,
                body_b: body,
                local_anchor_a: offset,
                local_anchor_b: Vec2::ZERO,
                local_axis: Vec2::X,
                lower: 0.0,
                upper: 0.0,
            }
        };
        world.create_joint(&joint)?;

        debug!(
            "Created wheel {} at ({:.2}, {:.2}) with {}",
            spec.position,
            world_position.x,
            world_position.y,
            joint.kind()
        );

        Ok(Self {
            position: spec.position,
            body,
            chassis,
            offset,
            powered: spec.powered,
            steering: spec.steering,
        })
    }

    pub fn position(&self) -> WheelPosition {
        self.position
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn is_steering(&self) -> bool {
        self.steering
    }

    /// Turn the wheel to `relative` radians off the chassis heading.
    pub fn set_angle(&self, relative: f32, world: &mut impl RigidBodyWorld) {
        let chassis_angle = world.angle(self.chassis);
        world.set_angle(self.body, chassis_angle + relative);
    }

    /// Push against the slip of the chassis at this wheel's anchor.
    ///
    /// The force acts along the wheel's local X axis at the wheel center.
    /// A crude stand-in for lateral tire grip.
    pub fn kill_sideways_velocity(&self, grip: f32, world: &mut impl RigidBodyWorld) {
        let velocity = world.linear_velocity_from_local_point(self.chassis, self.offset);
        let axis = world.world_vector(self.body, WHEEL_GRIP_AXIS);
        let force = grip_force(velocity, axis, grip);
        let center = world.world_center(self.body);
        world.apply_force(self.body, force, center);
    }

    /// Apply a longitudinal force of `magnitude` along the wheel's local +Y.
    pub fn apply_drive(&self, magnitude: f32, world: &mut impl RigidBodyWorld) {
        let force = world.world_vector(self.body, WHEEL_DRIVE_AXIS) * magnitude;
        let center = world.world_center(self.body);
        world.apply_force(self.body, force, center);
    }
}
