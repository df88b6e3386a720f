//! The car: a chassis body, four wheels and the per-tick control law.
//!
//! - `core` holds the pure control-law functions.
//! - `wheel` wraps one wheel body and its joint.

pub mod core;
mod wheel;

use tracing::debug;

pub use wheel::Wheel;

use crate::{
    command::{Control, DriverCommands, Steer},
    error::Result,
    spec::{VehicleParams, VehicleSpec},
    world::{BodyDesc, BodyHandle, BoxFixture, RigidBodyWorld},
};

use self::core::{integrate_wheel_angle, longitudinal_force};

/// Chassis linear damping.
const CHASSIS_LINEAR_DAMPING: f32 = 0.5;
/// Chassis angular damping.
const CHASSIS_ANGULAR_DAMPING: f32 = 0.3;
/// Chassis surface friction.
const CHASSIS_FRICTION: f32 = 0.3;
/// Chassis restitution.
const CHASSIS_RESTITUTION: f32 = 0.4;

/// Chassis, wheels and the driver's current commands.
#[derive(Clone, Debug)]
pub struct Vehicle {
    chassis: BodyHandle,
    wheels: Vec<Wheel>,
    params: VehicleParams,
    commands: DriverCommands,
    /// Current steering angle, within `[-max_wheel_angle, max_wheel_angle]`.
    wheel_angle: f32,
}

impl Vehicle {
    /// Build the chassis and its wheels in `world`.
    ///
    /// `spec` is expected to be validated already.
    pub fn new(
        spec: &VehicleSpec,
        params: VehicleParams,
        world: &mut impl RigidBodyWorld,
    ) -> Result<Self> {
        let placement = &spec.chassis;
        let chassis = world.create_body(
            &BodyDesc::dynamic(placement.position, placement.angle)
                .with_damping(CHASSIS_LINEAR_DAMPING, CHASSIS_ANGULAR_DAMPING)
                .with_bullet(true),
        );
        world.attach_box(
            chassis,
            &BoxFixture::new(placement.width / 2.0, placement.height / 2.0)
                .with_material(CHASSIS_FRICTION, CHASSIS_RESTITUTION),
        )?;

        let wheels = spec
            .wheels
            .iter()
            .map(|wheel| Wheel::new(wheel, chassis, world))
            .collect::<Result<Vec<_>>>()?;

        debug!("Created vehicle with chassis {chassis} and {} wheels", wheels.len());

        Ok(Self {
            chassis,
            wheels,
            params,
            commands: DriverCommands::default(),
            wheel_angle: 0.0,
        })
    }

    pub fn chassis(&self) -> BodyHandle {
        self.chassis
    }

    pub fn wheels(&self) -> &[Wheel] {
        &self.wheels
    }

    pub fn params(&self) -> &VehicleParams {
        &self.params
    }

    pub fn commands(&self) -> DriverCommands {
        self.commands
    }

    pub fn commands_mut(&mut self) -> &mut DriverCommands {
        &mut self.commands
    }

    pub fn set_steer(&mut self, steer: Steer) {
        self.commands.steer = steer;
    }

    pub fn set_control(&mut self, control: Control) {
        self.commands.control = control;
    }

    pub fn wheel_angle(&self) -> f32 {
        self.wheel_angle
    }

    /// Run the control law for one tick of `dt` seconds.
    ///
    /// Integrates the steering angle, then for every wheel applies grip,
    /// sets the steering angle on steering wheels and pushes powered wheels.
    pub fn update(&mut self, dt: f32, world: &mut impl RigidBodyWorld) {
        self.wheel_angle = integrate_wheel_angle(
            self.wheel_angle,
            self.commands.steer,
            self.params.max_wheel_angle,
            self.params.steer_rate,
            dt,
        );
        let force = longitudinal_force(self.commands.control, &self.params);

        for wheel in &self.wheels {
            wheel.kill_sideways_velocity(self.params.grip, world);
            if wheel.is_steering() {
                wheel.set_angle(self.wheel_angle, world);
            }
            if wheel.is_powered() {
                wheel.apply_drive(force, world);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::world::{BodyKind, mock::MockWorld};

    fn build() -> (MockWorld, Vehicle) {
        let mut world = MockWorld::default();
        let vehicle =
            Vehicle::new(&VehicleSpec::default(), VehicleParams::default(), &mut world).unwrap();
        world.reset_log();
        (world, vehicle)
    }

    #[test]
    fn test_initial_state() {
        let (world, vehicle) = build();
        assert_eq!(vehicle.commands(), DriverCommands::default());
        assert_eq!(vehicle.wheel_angle(), 0.0);
        assert_eq!(vehicle.params().max_wheel_angle, 0.35);
        assert_eq!(vehicle.wheels().len(), 4);

        let chassis = world.body(vehicle.chassis());
        assert_eq!(chassis.desc.kind, BodyKind::Dynamic);
        assert!(chassis.desc.bullet);
        assert_eq!(chassis.desc.linear_damping, 0.5);
        assert_eq!(chassis.desc.angular_damping, 0.3);
        assert_eq!(chassis.fixtures[0].half_extents, Vec2::new(1.0, 2.0));
        assert_eq!(chassis.fixtures[0].friction, 0.3);
        assert_eq!(chassis.fixtures[0].restitution, 0.4);
        assert_eq!(world.joints.len(), 4);
    }

    #[test]
    fn test_non_powered_wheels_get_no_drive() {
        let (mut world, mut vehicle) = build();
        vehicle.set_control(Control::Forward);
        vehicle.update(0.1, &mut world);

        for wheel in vehicle.wheels() {
            let calls = world.forces_on(wheel.body());
            if wheel.is_powered() {
                // Grip plus drive.
                assert_eq!(calls.len(), 2);
                assert!((calls[1].force.length() - 40.0).abs() < 1e-4);
            } else {
                // Grip only, and the car is at rest.
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].force, Vec2::ZERO);
            }
        }
        assert!(world.forces_on(vehicle.chassis()).is_empty());
    }

    #[test]
    fn test_forward_pushes_toward_negative_y() {
        let (mut world, mut vehicle) = build();
        vehicle.set_control(Control::Forward);
        vehicle.update(0.1, &mut world);

        let front = vehicle.wheels()[0].body();
        let drive = world.forces_on(front)[1].force;
        assert!((drive - Vec2::new(0.0, -40.0)).length() < 1e-4);

        vehicle.set_control(Control::Brake);
        world.reset_log();
        vehicle.update(0.1, &mut world);
        let brake = world.forces_on(front)[1].force;
        assert!((brake - Vec2::new(0.0, 35.0)).length() < 1e-4);
    }

    #[test]
    fn test_no_control_means_no_longitudinal_force() {
        let (mut world, mut vehicle) = build();
        vehicle.set_steer(Steer::Right);
        for _ in 0..5 {
            vehicle.update(0.05, &mut world);
        }
        assert!(world.forces.iter().all(|call| call.force == Vec2::ZERO));
    }

    #[test]
    fn test_only_steering_wheels_are_turned() {
        let (mut world, mut vehicle) = build();
        vehicle.set_steer(Steer::Left);
        vehicle.update(0.1, &mut world);
        vehicle.set_steer(Steer::None);
        vehicle.update(0.1, &mut world);

        let steering: Vec<_> = vehicle
            .wheels()
            .iter()
            .filter(|w| w.is_steering())
            .map(Wheel::body)
            .collect();
        assert_eq!(world.angle_sets.len(), 4);
        assert!(world.angle_sets.iter().all(|(body, _)| steering.contains(body)));
        assert!((world.angle_sets[0].1 + 0.21).abs() < 1e-6);
        assert_eq!(world.angle_sets[3].1, 0.0);
    }

    #[test]
    fn test_steering_angle_stays_within_lock() {
        let (mut world, mut vehicle) = build();
        let max = vehicle.params().max_wheel_angle;
        let pattern = [Steer::Right, Steer::Left, Steer::None];
        for i in 0..60 {
            vehicle.set_steer(pattern[(i / 7) % 3]);
            vehicle.update(0.016 * (i % 5) as f32, &mut world);
            assert!(vehicle.wheel_angle().abs() <= max);
        }
    }

    #[test]
    fn test_release_and_reversal() {
        let (mut world, mut vehicle) = build();
        let max = vehicle.params().max_wheel_angle;

        vehicle.set_steer(Steer::Left);
        vehicle.update(1.0, &mut world);
        assert_eq!(vehicle.wheel_angle(), -max);

        vehicle.set_steer(Steer::Right);
        vehicle.update(0.01, &mut world);
        let increment = max * 0.01 * 6.0;
        assert!((vehicle.wheel_angle() - increment.min(max)).abs() < 1e-7);

        vehicle.set_steer(Steer::None);
        vehicle.update(0.01, &mut world);
        assert_eq!(vehicle.wheel_angle(), 0.0);
    }
}
