//! Core vehicle control law.
//!
//! Pure functions that can be tested in isolation without an engine.
//! Used by the wheel and vehicle types and by the avian backend.

use std::f32::consts::{PI, TAU};

use glam::Vec2;

use crate::{
    command::{Control, Steer},
    spec::VehicleParams,
};

/// Wheel-local axis along which the grip force acts.
pub const WHEEL_GRIP_AXIS: Vec2 = Vec2::X;

/// Wheel-local axis along which drive and brake forces act.
pub const WHEEL_DRIVE_AXIS: Vec2 = Vec2::Y;

/// Advance the steering angle by one tick.
///
/// Holding a direction ramps toward that side's lock at
/// `max_angle * steer_rate` rad/s, first snapping to center if the wheels
/// were turned the other way. Releasing the input centers the wheels at once.
pub fn integrate_wheel_angle(
    current: f32,
    steer: Steer,
    max_angle: f32,
    steer_rate: f32,
    dt: f32,
) -> f32 {
    let increment = max_angle * dt * steer_rate;

    match steer {
        Steer::Right => (current.max(0.0) + increment).min(max_angle),
        Steer::Left => (current.min(0.0) - increment).max(-max_angle),
        Steer::None => 0.0,
    }
}

/// Longitudinal force magnitude along the wheel's local +Y for a control command.
pub fn longitudinal_force(control: Control, params: &VehicleParams) -> f32 {
    match control {
        Control::Forward => params.drive_force,
        Control::Brake => params.brake_force,
        Control::None => 0.0,
    }
}

/// Force that cancels the component of `velocity` along `axis`.
///
/// `axis` must be a unit vector.
pub fn grip_force(velocity: Vec2, axis: Vec2, grip: f32) -> Vec2 {
    axis * (-grip * velocity.dot(axis))
}

/// Compute mass from density and half extents (box area).
pub fn box_mass(density: f32, half_extents: Vec2) -> f32 {
    density * 4.0 * half_extents.x * half_extents.y
}

/// Moment of inertia of a solid box about its center.
pub fn box_inertia(mass: f32, half_extents: Vec2) -> f32 {
    mass * (half_extents.x * half_extents.x + half_extents.y * half_extents.y) / 3.0
}

/// Wrap an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Continue `previous` to the representative of `wrapped` nearest to it.
///
/// Keeps reported orientations continuous across full turns.
pub fn unwrap_angle(previous: f32, wrapped: f32) -> f32 {
    previous + wrap_angle(wrapped - previous)
}
