//! Owns the world, the vehicle and the walls, and advances them together.

use async_channel::{Receiver, Sender};
use glam::Vec2;
use tracing::{debug, info, warn};

use crate::{
    command::{Control, DriverCommand, DriverCommands, Steer},
    error::{Error, Result},
    observer::{PoseObserver, PoseRecorder, PoseRegistry},
    spec::{SimulationSpec, WHEEL_COUNT},
    vehicle::Vehicle,
    wall::Wall,
    world::{AvianWorld, RigidBodyWorld, SolverIterations},
};

/// Iteration counts used for every step.
pub const SOLVER_ITERATIONS: SolverIterations = SolverIterations {
    velocity: 10,
    position: 8,
};

/// Longest step taken in one update. Longer frames are truncated.
pub const MAX_STEP_SECS: f32 = 0.25;

/// Shortest step the world is advanced by. Shorter frames do not step.
pub const MIN_STEP_SECS: f32 = 1e-6;

/// Turn a host frame time into a safe step length.
///
/// Negative, non-finite and sub-[`MIN_STEP_SECS`] values become 0; values
/// above [`MAX_STEP_SECS`] are clamped.
pub fn sanitize_dt(dt: f32) -> f32 {
    if !dt.is_finite() || dt < MIN_STEP_SECS {
        0.0
    } else {
        dt.min(MAX_STEP_SECS)
    }
}

/// One observer for the chassis and one per wheel, in spec order.
pub struct VehicleObservers {
    pub chassis: Box<dyn PoseObserver>,
    pub wheels: Vec<Box<dyn PoseObserver>>,
}

impl VehicleObservers {
    pub fn new(
        chassis: impl PoseObserver + 'static,
        wheels: impl IntoIterator<Item = Box<dyn PoseObserver>>,
    ) -> Self {
        Self {
            chassis: Box::new(chassis),
            wheels: wheels.into_iter().collect(),
        }
    }

    /// Observers that record into [`PoseRecorder`]s.
    ///
    /// Returns the chassis recorder and the wheel recorders alongside.
    pub fn recording() -> (Self, PoseRecorder, Vec<PoseRecorder>) {
        let chassis = PoseRecorder::new();
        let wheels: Vec<PoseRecorder> = (0..WHEEL_COUNT).map(|_| PoseRecorder::new()).collect();
        let observers = Self::new(
            chassis.clone(),
            wheels
                .iter()
                .map(|recorder| Box::new(recorder.clone()) as Box<dyn PoseObserver>),
        );
        (observers, chassis, wheels)
    }
}

/// Snapshot of the car for telemetry and reporting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VehicleStatus {
    pub commands: DriverCommands,
    pub wheel_angle: f32,
    pub position: Vec2,
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    /// Simulated seconds since construction.
    pub elapsed: f32,
    /// Number of updates since construction.
    pub ticks: u64,
}

/// A car and its walls in a zero-gravity world.
pub struct Simulation<W: RigidBodyWorld = AvianWorld> {
    world: W,
    vehicle: Vehicle,
    walls: Vec<Wall>,
    observers: PoseRegistry,
    command_tx: Sender<DriverCommand>,
    command_rx: Receiver<DriverCommand>,
    elapsed: f32,
    ticks: u64,
}

impl Simulation<AvianWorld> {
    /// Build a simulation backed by avian2d.
    pub fn new(spec: &SimulationSpec, observers: VehicleObservers) -> Result<Self> {
        check(spec, &observers)?;
        Self::with_world(AvianWorld::new(), spec, observers)
    }
}

impl<W: RigidBodyWorld> Simulation<W> {
    /// Build a simulation in an existing, empty world.
    pub fn with_world(
        mut world: W,
        spec: &SimulationSpec,
        observers: VehicleObservers,
    ) -> Result<Self> {
        check(spec, &observers)?;

        let vehicle = Vehicle::new(&spec.vehicle, spec.params.clone(), &mut world)?;
        let walls = spec
            .walls
            .iter()
            .map(|wall| Wall::new(wall, &mut world))
            .collect::<Result<Vec<_>>>()?;

        let mut registry = PoseRegistry::new();
        registry.insert(vehicle.chassis(), observers.chassis);
        for (wheel, observer) in vehicle.wheels().iter().zip(observers.wheels) {
            registry.insert(wheel.body(), observer);
        }

        let (command_tx, command_rx) = async_channel::unbounded();

        info!(
            "Simulation ready: vehicle at ({:.2}, {:.2}), {} walls",
            spec.vehicle.chassis.position.x,
            spec.vehicle.chassis.position.y,
            walls.len()
        );

        Ok(Self {
            world,
            vehicle,
            walls,
            observers: registry,
            command_tx,
            command_rx,
            elapsed: 0.0,
            ticks: 0,
        })
    }

    /// Set the throttle/brake command for the next update.
    pub fn set_control(&mut self, control: Control) {
        self.vehicle.set_control(control);
    }

    /// Set the steering command for the next update.
    pub fn set_steer(&mut self, steer: Steer) {
        self.vehicle.set_steer(steer);
    }

    /// Sender for commands produced on other threads.
    ///
    /// Pending commands are applied in order at the start of the next update.
    pub fn command_sender(&self) -> Sender<DriverCommand> {
        self.command_tx.clone()
    }

    /// Advance by `dt` seconds and publish every tagged body's pose.
    pub fn update(&mut self, dt: f32) {
        let step = sanitize_dt(dt);
        if dt.to_bits() != step.to_bits() {
            debug!("Adjusted dt {dt} to {step}");
        }

        while let Ok(command) = self.command_rx.try_recv() {
            self.vehicle.commands_mut().apply(command);
        }

        self.vehicle.update(step, &mut self.world);
        self.world.step(step, SOLVER_ITERATIONS);
        self.world.clear_forces();
        self.observers.publish(&self.world);

        self.elapsed += step;
        self.ticks += 1;
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn status(&self) -> VehicleStatus {
        let chassis = self.vehicle.chassis();
        VehicleStatus {
            commands: self.vehicle.commands(),
            wheel_angle: self.vehicle.wheel_angle(),
            position: self.world.world_center(chassis),
            angle: self.world.angle(chassis),
            linear_velocity: self.world.linear_velocity(chassis),
            angular_velocity: self.world.angular_velocity(chassis),
            elapsed: self.elapsed,
            ticks: self.ticks,
        }
    }

    /// End the run, telling every observer its body is gone.
    pub fn shutdown(mut self) {
        self.observers.remove_all();
        self.command_rx.close();
        info!(
            "Simulation shut down after {} ticks ({:.2} s)",
            self.ticks, self.elapsed
        );
    }
}

fn check(spec: &SimulationSpec, observers: &VehicleObservers) -> Result<()> {
    let result = spec.validate().and_then(|()| {
        if observers.wheels.len() == WHEEL_COUNT {
            Ok(())
        } else {
            Err(Error::ObserverCount {
                expected: WHEEL_COUNT,
                actual: observers.wheels.len(),
            })
        }
    });
    if let Err(e) = &result {
        warn!("Rejected simulation spec: {e}");
    }
    result
}
