//! Declarative description of a car and its surroundings.
//!
//! Specs are plain data. They can be built in code, taken from
//! [`VehicleSpec::default`], or loaded from a JSON file with
//! [`SimulationSpec::load`]. Pose observers are supplied separately when the
//! simulation is constructed, see [`crate::VehicleObservers`].

use std::{fmt, path::Path};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where a body is created and how big its collision box is.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Position of the body center. Wheel placements are relative to the chassis.
    pub position: Vec2,
    /// Orientation in radians.
    #[serde(default)]
    pub angle: f32,
    /// Extent along the local X axis.
    pub width: f32,
    /// Extent along the local Y axis.
    pub height: f32,
}

impl Placement {
    /// Create a placement.
    pub fn new(position: Vec2, angle: f32, width: f32, height: f32) -> Self {
        Self {
            position,
            angle,
            width,
            height,
        }
    }

    /// Reject non-finite coordinates and non-positive extents.
    pub fn validate(&self, context: &str) -> Result<()> {
        let invalid = |detail: String| Error::InvalidPlacement {
            context: context.to_string(),
            detail,
        };

        if !self.position.is_finite() || !self.angle.is_finite() {
            return Err(invalid(format!(
                "non-finite pose ({}, {}) @ {}",
                self.position.x, self.position.y, self.angle
            )));
        }
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(invalid(format!("width must be positive, got {}", self.width)));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(invalid(format!(
                "height must be positive, got {}",
                self.height
            )));
        }
        Ok(())
    }
}

/// Role of a wheel on the chassis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WheelPosition {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl WheelPosition {
    /// All roles, front pair first.
    pub const ALL: [WheelPosition; 4] = [
        WheelPosition::FrontLeft,
        WheelPosition::FrontRight,
        WheelPosition::RearLeft,
        WheelPosition::RearRight,
    ];

    /// Whether the wheel sits on the front axle.
    pub fn is_front(self) -> bool {
        matches!(self, WheelPosition::FrontLeft | WheelPosition::FrontRight)
    }

    fn name(self) -> &'static str {
        match self {
            WheelPosition::FrontLeft => "FrontLeft",
            WheelPosition::FrontRight => "FrontRight",
            WheelPosition::RearLeft => "RearLeft",
            WheelPosition::RearRight => "RearRight",
        }
    }
}

impl fmt::Display for WheelPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One wheel: chassis-relative placement plus drive flags.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WheelSpec {
    /// Explicit role of this wheel.
    pub position: WheelPosition,
    /// Placement relative to the chassis center.
    pub placement: Placement,
    /// Receives longitudinal drive force.
    pub powered: bool,
    /// Receives the steering angle.
    pub steering: bool,
}

/// A chassis and its four wheels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleSpec {
    /// Chassis placement in world space.
    pub chassis: Placement,
    /// Wheels in spec order: front pair first, rear pair second.
    pub wheels: Vec<WheelSpec>,
}

/// Number of wheels every vehicle carries.
pub const WHEEL_COUNT: usize = 4;

/// Default chassis width.
const CHASSIS_WIDTH: f32 = 2.0;
/// Default chassis height (length along the direction of travel).
const CHASSIS_HEIGHT: f32 = 4.0;
/// Default wheel width.
const WHEEL_WIDTH: f32 = 0.4;
/// Default wheel height.
const WHEEL_HEIGHT: f32 = 0.8;
/// Default lateral wheel offset from the chassis center.
const WHEEL_TRACK_OFFSET: f32 = 1.0;
/// Default longitudinal wheel offset from the chassis center.
const WHEEL_BASE_OFFSET: f32 = 1.2;

impl Default for VehicleSpec {
    /// The stock car: a 2×4 chassis at the origin, steerable powered front
    /// wheels at y = -1.2 and fixed rear wheels at y = 1.2.
    fn default() -> Self {
        let wheel = |position: WheelPosition, x: f32, y: f32| {
            let front = position.is_front();
            WheelSpec {
                position,
                placement: Placement::new(Vec2::new(x, y), 0.0, WHEEL_WIDTH, WHEEL_HEIGHT),
                powered: front,
                steering: front,
            }
        };

        Self {
            chassis: Placement::new(Vec2::ZERO, 0.0, CHASSIS_WIDTH, CHASSIS_HEIGHT),
            wheels: vec![
                wheel(
                    WheelPosition::FrontLeft,
                    -WHEEL_TRACK_OFFSET,
                    -WHEEL_BASE_OFFSET,
                ),
                wheel(
                    WheelPosition::FrontRight,
                    WHEEL_TRACK_OFFSET,
                    -WHEEL_BASE_OFFSET,
                ),
                wheel(
                    WheelPosition::RearLeft,
                    -WHEEL_TRACK_OFFSET,
                    WHEEL_BASE_OFFSET,
                ),
                wheel(
                    WheelPosition::RearRight,
                    WHEEL_TRACK_OFFSET,
                    WHEEL_BASE_OFFSET,
                ),
            ],
        }
    }
}

impl VehicleSpec {
    /// Check wheel count, role uniqueness and geometry.
    pub fn validate(&self) -> Result<()> {
        if self.wheels.len() != WHEEL_COUNT {
            return Err(Error::WheelCount {
                actual: self.wheels.len(),
            });
        }

        self.chassis.validate("chassis")?;

        for (i, wheel) in self.wheels.iter().enumerate() {
            if self.wheels[..i].iter().any(|w| w.position == wheel.position) {
                return Err(Error::DuplicateWheel {
                    position: wheel.position.name(),
                });
            }
            wheel.placement.validate(&format!("wheel {}", wheel.position))?;
        }

        Ok(())
    }
}

/// A static obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallSpec {
    /// Placement in world space.
    pub placement: Placement,
}

/// Tuning constants for the vehicle control law.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleParams {
    /// Steering lock in radians.
    pub max_wheel_angle: f32,
    /// Steering rate as a multiple of the steering lock per second.
    pub steer_rate: f32,
    /// Force along the wheel's local +Y while driving forward (negative pushes the car forward).
    pub drive_force: f32,
    /// Force along the wheel's local +Y while braking.
    pub brake_force: f32,
    /// Gain of the velocity-cancelling grip force.
    pub grip: f32,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            max_wheel_angle: 0.35,
            steer_rate: 6.0,
            drive_force: -40.0,
            brake_force: 35.0,
            grip: 5.0,
        }
    }
}

impl VehicleParams {
    /// Reject non-finite values, and negative lock, steering rate or grip.
    ///
    /// Either of the first two would let the steering angle leave
    /// `[-max_wheel_angle, max_wheel_angle]`; negative grip amplifies slip.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("max_wheel_angle", self.max_wheel_angle, true),
            ("steer_rate", self.steer_rate, true),
            ("drive_force", self.drive_force, false),
            ("brake_force", self.brake_force, false),
            ("grip", self.grip, true),
        ];
        for (name, value, non_negative) in fields {
            let detail = if !value.is_finite() {
                format!("{name} must be finite, got {value}")
            } else if non_negative && value < 0.0 {
                format!("{name} must be non-negative, got {value}")
            } else {
                continue;
            };
            return Err(Error::InvalidPlacement {
                context: "params".to_string(),
                detail,
            });
        }
        Ok(())
    }
}

/// Everything needed to build a [`crate::Simulation`] besides its observers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSpec {
    /// The car.
    #[serde(default)]
    pub vehicle: VehicleSpec,
    /// Static obstacles.
    #[serde(default)]
    pub walls: Vec<WallSpec>,
    /// Control law constants.
    #[serde(default)]
    pub params: VehicleParams,
}

impl SimulationSpec {
    /// Validate the vehicle and every wall.
    pub fn validate(&self) -> Result<()> {
        self.vehicle.validate()?;
        for (i, wall) in self.walls.iter().enumerate() {
            wall.placement.validate(&format!("wall {i}"))?;
        }
        self.params.validate()
    }

    /// Parse a spec from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a spec from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
