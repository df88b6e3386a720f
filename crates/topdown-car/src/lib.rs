//! Top-down car dynamics on a 2D rigid-body world.
//!
//! A chassis body and four wheel bodies are jointed together and driven by a
//! small control law: steering sets the front wheels' angle, throttle and
//! brake push the powered wheels, and every wheel bleeds off slip velocity to
//! approximate tire grip. Poses are pushed to per-body observers after each
//! step so a renderer can mirror them.
//!
//! # Design principles
//!
//! - **Engine behind a trait**: the model only sees [`world::RigidBodyWorld`];
//!   [`world::AvianWorld`] is the avian2d implementation
//! - **No globals**: command state lives in the [`Simulation`]
//! - **Fail at construction**: a malformed spec is rejected up front, stepping
//!   never fails
//!
//! # Example
//!
//! ```ignore
//! use topdown_car::{Control, Simulation, SimulationSpec, VehicleObservers};
//!
//! let (observers, chassis, _wheels) = VehicleObservers::recording();
//! let mut simulation = Simulation::new(&SimulationSpec::default(), observers)?;
//!
//! simulation.set_control(Control::Forward);
//! for _ in 0..60 {
//!     simulation.update(1.0 / 60.0);
//! }
//! println!("{:?}", chassis.last());
//! ```

pub mod command;
mod error;
pub mod observer;
pub mod simulation;
pub mod spec;
pub mod telemetry;
pub mod vehicle;
mod wall;
pub mod world;

pub use command::{Control, DriverCommand, DriverCommands, Steer};
pub use error::{Error, Result};
pub use observer::{Pose, PoseObserver, PoseRecorder};
pub use simulation::{
    MAX_STEP_SECS, MIN_STEP_SECS, Simulation, VehicleObservers, VehicleStatus,
};
pub use spec::{
    Placement, SimulationSpec, VehicleParams, VehicleSpec, WallSpec, WheelPosition, WheelSpec,
};
pub use vehicle::{Vehicle, Wheel};
pub use wall::Wall;
pub use world::AvianWorld;
